use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use crate::checksum_type::ChecksumType;
use crate::codec::fixed_int::{read_exact, read_u16, read_u32, read_u8};

pub const DEFAULT_BINLOG_VERSION: u16 = 4;
pub const DEFAULT_COMMON_HEADER_LENGTH: u8 = 19;
const SERVER_VERSION_LEN: usize = 50;

/// Format Description Event post-header (98 bytes for the default event
/// catalog): server/version identification plus the per-event-type
/// post-header length table that governs every subsequent event in the
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptionPostHeader {
    pub binlog_version: u16,
    pub server_version: [u8; SERVER_VERSION_LEN],
    pub create_timestamp: u32,
    pub common_header_length: u8,
    pub post_header_lengths: Vec<u8>,
}

impl FormatDescriptionPostHeader {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        let mut cursor = Cursor::new(bytes);
        let binlog_version = read_u16(&mut cursor)?;
        let server_version_vec = read_exact(&mut cursor, SERVER_VERSION_LEN)?;
        let mut server_version = [0u8; SERVER_VERSION_LEN];
        server_version.copy_from_slice(&server_version_vec);
        let create_timestamp = read_u32(&mut cursor)?;
        let common_header_length = read_u8(&mut cursor)?;
        let post_header_lengths = bytes[cursor.position() as usize..].to_vec();
        Ok(FormatDescriptionPostHeader {
            binlog_version,
            server_version,
            create_timestamp,
            common_header_length,
            post_header_lengths,
        })
    }

    /// Server version string, trimmed at the first NUL byte in the
    /// fixed-width field.
    pub fn server_version_str(&self) -> String {
        let end = self.server_version.iter().position(|&b| b == 0).unwrap_or(SERVER_VERSION_LEN);
        String::from_utf8_lossy(&self.server_version[..end]).into_owned()
    }

    pub fn post_header_len_for(&self, type_code: u8) -> Option<u8> {
        if type_code == 0 {
            return None;
        }
        self.post_header_lengths.get(type_code as usize - 1).copied()
    }
}

/// Format Description Event body: exactly one byte, the checksum
/// algorithm applied to every subsequent event's footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptionBody {
    pub checksum_algorithm: ChecksumType,
}

impl FormatDescriptionBody {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        if bytes.len() != 1 {
            return Err(IngestError::malformed_frame(format!(
                "format_description body must be 1 byte, got {}",
                bytes.len()
            )));
        }
        Ok(FormatDescriptionBody { checksum_algorithm: ChecksumType::from_code(bytes[0])? })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_post_header(post_header_lengths: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&DEFAULT_BINLOG_VERSION.to_le_bytes());
        let mut version = [0u8; SERVER_VERSION_LEN];
        version[..5].copy_from_slice(b"8.0.3");
        bytes.extend_from_slice(&version);
        bytes.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        bytes.push(DEFAULT_COMMON_HEADER_LENGTH);
        bytes.extend_from_slice(post_header_lengths);
        bytes
    }

    #[test]
    fn decodes_post_header_and_trims_server_version() {
        let lengths = [8u8, 13, 0, 8];
        let bytes = sample_post_header(&lengths);
        let header = FormatDescriptionPostHeader::decode(&bytes).unwrap();
        assert_eq!(header.binlog_version, DEFAULT_BINLOG_VERSION);
        assert_eq!(header.common_header_length, DEFAULT_COMMON_HEADER_LENGTH);
        assert_eq!(header.server_version_str(), "8.0.3");
        assert_eq!(header.post_header_lengths, lengths);
        assert_eq!(header.post_header_len_for(1), Some(8));
    }

    #[test]
    fn decodes_checksum_body() {
        assert_eq!(
            FormatDescriptionBody::decode(&[1]).unwrap().checksum_algorithm,
            ChecksumType::Crc32
        );
        assert!(FormatDescriptionBody::decode(&[2]).is_err());
        assert!(FormatDescriptionBody::decode(&[0, 0]).is_err());
    }
}
