use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::err::IngestError;

/// A byte count parsed from a decimal number with an optional single-letter
/// suffix: `_` (bytes, shift 0), `K` (shift 10), `M` (shift 20), `G` (shift
/// 30), `T` (shift 40), `P` (shift 50). `0` is zero regardless of suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SizeUnit(pub u64);

const SUFFIX_SHIFTS: &[(char, u32)] = &[('_', 0), ('K', 10), ('M', 20), ('G', 30), ('T', 40), ('P', 50)];

impl SizeUnit {
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for SizeUnit {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IngestError::configuration("empty size value"));
        }

        let (digits, suffix) = match s.chars().last() {
            Some(c) if c.is_ascii_digit() => (s, None),
            Some(c) => (&s[..s.len() - c.len_utf8()], Some(c)),
            None => unreachable!(),
        };

        let value: u64 = digits
            .parse()
            .map_err(|e| IngestError::configuration(format!("invalid size value {s:?}: {e}")))?;

        if value == 0 {
            return Ok(SizeUnit(0));
        }

        let shift = match suffix {
            None => 0,
            Some(c) => SUFFIX_SHIFTS
                .iter()
                .find(|(letter, _)| *letter == c)
                .map(|(_, shift)| *shift)
                .ok_or_else(|| IngestError::configuration(format!("unknown size suffix {c:?} in {s:?}")))?,
        };

        if shift > 0 && value > (u64::MAX >> shift) {
            return Err(IngestError::configuration(format!("size value {s:?} overflows u64")));
        }

        Ok(SizeUnit(value << shift))
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SizeUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SizeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = SizeUnit;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a size such as \"512\", \"64K\", \"10M\", \"1G\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SizeUnit, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SizeUnit, E> {
                Ok(SizeUnit(v))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bare_number() {
        assert_eq!("512".parse::<SizeUnit>().unwrap().bytes(), 512);
    }

    #[test]
    fn parses_each_suffix() {
        assert_eq!("1_".parse::<SizeUnit>().unwrap().bytes(), 1);
        assert_eq!("1K".parse::<SizeUnit>().unwrap().bytes(), 1 << 10);
        assert_eq!("1M".parse::<SizeUnit>().unwrap().bytes(), 1 << 20);
        assert_eq!("1G".parse::<SizeUnit>().unwrap().bytes(), 1 << 30);
        assert_eq!("1T".parse::<SizeUnit>().unwrap().bytes(), 1u64 << 40);
        assert_eq!("1P".parse::<SizeUnit>().unwrap().bytes(), 1u64 << 50);
    }

    #[test]
    fn zero_is_zero_regardless_of_suffix() {
        assert_eq!("0G".parse::<SizeUnit>().unwrap().bytes(), 0);
    }

    #[test]
    fn rejects_unknown_suffix() {
        assert!("5X".parse::<SizeUnit>().is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(format!("{}P", u64::MAX).parse::<SizeUnit>().is_err());
    }
}
