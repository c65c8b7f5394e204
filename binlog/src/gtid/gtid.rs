use std::fmt;

use common::err::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

use super::tag::Tag;
use super::uuid::Uuid;

/// Sentinel "no GNO assigned" value; the valid range is `[1, MAX_GNO]`.
pub const MAX_GNO: u64 = i64::MAX as u64;

/// Triple `(uuid, tag, gno)` identifying one transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct Gtid {
    pub uuid: Uuid,
    pub tag: Tag,
    pub gno: u64,
}

impl Gtid {
    pub fn new(uuid: Uuid, tag: Tag, gno: u64) -> IngestResult<Self> {
        if uuid.is_nil() {
            return Err(IngestError::malformed_frame("gtid uuid must not be nil"));
        }
        if gno == 0 || gno > MAX_GNO {
            return Err(IngestError::malformed_frame(format!("gtid gno {gno} out of range [1, {MAX_GNO}]")));
        }
        Ok(Gtid { uuid, tag, gno })
    }

    /// Convenience constructor for the untagged form.
    pub fn untagged(uuid: Uuid, gno: u64) -> IngestResult<Self> {
        Gtid::new(uuid, Tag::empty(), gno)
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.is_empty() {
            write!(f, "{}:{}", self.uuid, self.gno)
        } else {
            write!(f, "{}:{}:{}", self.uuid, self.tag, self.gno)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_with_and_without_tag() {
        let uuid = Uuid::parse("f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f").unwrap();
        let gtid = Gtid::untagged(uuid, 42).unwrap();
        assert_eq!(gtid.to_string(), "f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f:42");

        let default_gtid = Gtid::default();
        assert_eq!(default_gtid.to_string(), "00000000-0000-0000-0000-000000000000:0");
    }

    #[test]
    fn rejects_nil_uuid_and_out_of_range_gno() {
        let uuid = Uuid::parse("f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f").unwrap();
        assert!(Gtid::untagged(Uuid::NIL, 1).is_err());
        assert!(Gtid::untagged(uuid, 0).is_err());
        assert!(Gtid::untagged(uuid, MAX_GNO + 1).is_err());
        assert!(Gtid::untagged(uuid, MAX_GNO).is_ok());
    }
}
