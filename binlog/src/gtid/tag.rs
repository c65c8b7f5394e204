use std::fmt;
use std::io::Cursor;

use common::err::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

use crate::codec::{calculate_varlen_int_size, read_varlen_uint, write_varlen_uint};
use crate::codec::fixed_int::read_exact;

/// Max length of a GTID tag name, not counting the length prefix.
pub const MAX_LEN: usize = 32;

/// A GTID tag: an empty string, or a name matching
/// `[A-Za-z_][A-Za-z0-9_]{0,31}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Default)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> IngestResult<Self> {
        let name = name.into();
        if !Self::is_valid(&name) {
            return Err(IngestError::malformed_frame(format!("invalid gtid tag: {name:?}")));
        }
        Ok(Tag(name))
    }

    pub fn empty() -> Self {
        Tag(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        if name.len() > MAX_LEN {
            return false;
        }
        let mut chars = name.chars();
        let first = chars.next().expect("non-empty");
        if !(first == '_' || first.is_ascii_alphabetic()) {
            return false;
        }
        chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
    }

    pub fn calculate_encoded_size(&self) -> usize {
        calculate_varlen_int_size(self.0.len() as u64) + self.0.len()
    }

    pub fn encode_to(&self, out: &mut Vec<u8>) {
        write_varlen_uint(out, self.0.len() as u64);
        out.extend_from_slice(self.0.as_bytes());
    }

    pub fn decode_from(cursor: &mut Cursor<&[u8]>) -> IngestResult<Self> {
        let len = read_varlen_uint(cursor)? as usize;
        if len > MAX_LEN {
            return Err(IngestError::malformed_frame(format!("gtid tag length {len} exceeds max {MAX_LEN}")));
        }
        let bytes = read_exact(cursor, len)?;
        let name = String::from_utf8(bytes)
            .map_err(|e| IngestError::malformed_frame(format!("gtid tag is not valid utf-8: {e}")))?;
        Tag::new(name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
