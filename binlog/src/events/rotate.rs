use std::io::Cursor;

use common::err::IngestResult;

use crate::codec::fixed_int::read_u64;

/// `rotate` event post-header: 8 bytes, the absolute offset of the first
/// real event in the file being rotated to (must be `4` -- the
/// post-magic offset -- for a real rotate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatePostHeader {
    pub position: u64,
}

impl RotatePostHeader {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        let mut cursor = Cursor::new(bytes);
        let position = read_u64(&mut cursor)?;
        Ok(RotatePostHeader { position })
    }
}

/// `rotate` event body: the raw bytes of the binlog file name being
/// rotated to. No length prefix -- the remaining event bytes are the name
/// verbatim. Bounded in practice to the filesystem's max name length; this
/// crate does not enforce a hard cap, matching the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateBody {
    pub next_binlog_name: Vec<u8>,
}

impl RotateBody {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        Ok(RotateBody { next_binlog_name: bytes.to_vec() })
    }

    pub fn name_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.next_binlog_name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_post_header_and_body() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u64.to_le_bytes());
        let header = RotatePostHeader::decode(&bytes).unwrap();
        assert_eq!(header.position, 4);

        let body = RotateBody::decode(b"binlog.000002").unwrap();
        assert_eq!(body.name_lossy(), "binlog.000002");
    }
}
