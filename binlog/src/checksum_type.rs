use common::err::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

/// binlog checksum algorithm, as declared in the footer of a Format
/// Description Event and applied to every subsequent event.
pub const CHECKSUM_ALG_DESC_LEN: usize = 1;
pub const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum ChecksumType {
    /// Checksum is disabled; events carry no footer.
    Off = 0,
    /// CRC32 checksum; events carry a 4-byte footer.
    Crc32 = 1,
}

impl ChecksumType {
    pub fn from_code(code: u8) -> IngestResult<Self> {
        match code {
            0 => Ok(ChecksumType::Off),
            1 => Ok(ChecksumType::Crc32),
            other => Err(IngestError::malformed_frame(format!(
                "unsupported checksum algorithm code: {other}"
            ))),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn footer_len(self) -> usize {
        match self {
            ChecksumType::Off => 0,
            ChecksumType::Crc32 => CHECKSUM_LEN,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_known_codes() {
        assert_eq!(ChecksumType::from_code(0).unwrap(), ChecksumType::Off);
        assert_eq!(ChecksumType::from_code(1).unwrap(), ChecksumType::Crc32);
    }

    #[test]
    fn rejects_unknown_code() {
        assert!(ChecksumType::from_code(2).is_err());
    }

    #[test]
    fn footer_len_matches_algorithm() {
        assert_eq!(ChecksumType::Off.footer_len(), 0);
        assert_eq!(ChecksumType::Crc32.footer_len(), 4);
    }
}
