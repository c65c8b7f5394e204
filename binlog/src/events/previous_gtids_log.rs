use common::err::IngestResult;

use crate::gtid::gtid_set::GtidSet;

/// `previous_gtids_log` body: the entire binary GTID-set encoding,
/// unframed -- the body length IS the encoding length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousGtidsLogBody {
    pub gtid_set: GtidSet,
}

impl PreviousGtidsLogBody {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        Ok(PreviousGtidsLogBody { gtid_set: GtidSet::decode_from(bytes)? })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gtid::tag::Tag;
    use crate::gtid::uuid::Uuid;

    #[test]
    fn decodes_embedded_gtid_set() {
        let mut set = GtidSet::new();
        set.add_interval(Uuid::from_bytes([0x11; 16]), Tag::empty(), 1, 3);
        let mut bytes = Vec::new();
        set.encode_to(&mut bytes);

        let body = PreviousGtidsLogBody::decode(&bytes).unwrap();
        assert_eq!(body.gtid_set, set);
    }
}
