use std::fmt;

use common::err::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

/// A source identifier: 16 raw bytes, displayed in canonical 8-4-4-4-12
/// hyphenated hex, same as a MySQL `server_uuid`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Uuid([u8; 16]);

pub const ENCODED_LEN: usize = 16;

impl Uuid {
    pub const NIL: Uuid = Uuid([0u8; 16]);

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Uuid(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }

    /// Parses canonical hyphenated (`8-4-4-4-12`), unhyphenated (32 hex
    /// digits), or brace-wrapped (`{...}`) forms. Rejects any other length,
    /// non-hex digit, or misplaced hyphen.
    pub fn parse(text: &str) -> IngestResult<Self> {
        let starts_brace = text.starts_with('{');
        let ends_brace = text.ends_with('}');
        let stripped = match (starts_brace, ends_brace) {
            (true, true) => &text[1..text.len() - 1],
            (false, false) => text,
            _ => {
                return Err(IngestError::malformed_frame(format!(
                    "mismatched braces in uuid literal: {text}"
                )))
            }
        };

        let hex_only: String = if stripped.contains('-') {
            let parts: Vec<&str> = stripped.split('-').collect();
            let expected_lengths = [8, 4, 4, 4, 12];
            if parts.len() != expected_lengths.len()
                || parts.iter().zip(expected_lengths).any(|(p, len)| p.len() != len)
            {
                return Err(IngestError::malformed_frame(format!(
                    "malformed hyphenated uuid literal: {text}"
                )));
            }
            parts.concat()
        } else {
            stripped.to_string()
        };

        if hex_only.len() != 32 {
            return Err(IngestError::malformed_frame(format!(
                "uuid literal has wrong length: {text}"
            )));
        }

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(&hex_only, &mut bytes)
            .map_err(|e| IngestError::malformed_frame(format!("invalid hex in uuid literal {text}: {e}")))?;
        Ok(Uuid(bytes))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nil_renders_as_all_zero() {
        assert_eq!(Uuid::NIL.to_string(), "00000000-0000-0000-0000-000000000000");
        assert!(Uuid::NIL.is_nil());
    }

    #[test]
    fn parses_canonical_hyphenated() {
        let s = "f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f";
        let uuid = Uuid::parse(s).unwrap();
        assert_eq!(uuid.to_string(), s);
    }

    #[test]
    fn parses_unhyphenated_and_brace_wrapped() {
        let canonical = "f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f";
        let unhyphenated = "f0e1d2c3b4a5968778695a4b3c2d1e0f";
        assert_eq!(Uuid::parse(unhyphenated).unwrap().to_string(), canonical);

        let braced = "{f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f}";
        assert_eq!(Uuid::parse(braced).unwrap().to_string(), canonical);
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert!(Uuid::parse("abcd").is_err());
        assert!(Uuid::parse("g0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f").is_err());
        assert!(Uuid::parse("f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0").is_err());
    }

    #[test]
    fn rejects_mismatched_braces() {
        assert!(Uuid::parse("{f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f").is_err());
        assert!(Uuid::parse("f0e1d2c3-b4a5-9687-7869-5a4b3c2d1e0f}").is_err());
    }

    #[test]
    fn rejects_misplaced_hyphen() {
        assert!(Uuid::parse("f0e1d2c-3b4a5-9687-7869-5a4b3c2d1e0f").is_err());
    }
}
