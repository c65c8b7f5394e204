use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use crate::codec::fixed_int::read_u32;

pub const FOOTER_LEN: usize = 4;

/// Event footer: a 4-byte CRC32 checksum, present iff the active
/// checksum algorithm is `crc32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub crc: u32,
}

impl Footer {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        if bytes.len() != FOOTER_LEN {
            return Err(IngestError::malformed_frame(format!(
                "footer must be {FOOTER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut cursor = Cursor::new(bytes);
        Ok(Footer { crc: read_u32(&mut cursor)? })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_crc_footer() {
        let footer = Footer::decode(&0xDEADBEEFu32.to_le_bytes()).unwrap();
        assert_eq!(footer.crc, 0xDEADBEEF);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Footer::decode(&[0, 0, 0]).is_err());
    }
}
