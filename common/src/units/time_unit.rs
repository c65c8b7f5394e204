use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::err::IngestError;

/// A duration in seconds parsed from a decimal number with an optional
/// single-letter suffix: `s` (x1), `m` (x60), `h` (x3600), `d` (x86400),
/// `w` (x604800). `0` is zero regardless of suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TimeUnit(pub u64);

const SUFFIX_MULTIPLIERS: &[(char, u64)] =
    &[('s', 1), ('m', 60), ('h', 3600), ('d', 86_400), ('w', 604_800)];

impl TimeUnit {
    pub fn seconds(self) -> u64 {
        self.0
    }
}

impl FromStr for TimeUnit {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IngestError::configuration("empty time value"));
        }

        let (digits, suffix) = match s.chars().last() {
            Some(c) if c.is_ascii_digit() => (s, None),
            Some(c) => (&s[..s.len() - c.len_utf8()], Some(c)),
            None => unreachable!(),
        };

        let value: u64 = digits
            .parse()
            .map_err(|e| IngestError::configuration(format!("invalid time value {s:?}: {e}")))?;

        if value == 0 {
            return Ok(TimeUnit(0));
        }

        let multiplier = match suffix {
            None => 1,
            Some(c) => SUFFIX_MULTIPLIERS
                .iter()
                .find(|(letter, _)| *letter == c)
                .map(|(_, m)| *m)
                .ok_or_else(|| IngestError::configuration(format!("unknown time suffix {c:?} in {s:?}")))?,
        };

        if multiplier > 1 && value > u64::MAX / multiplier {
            return Err(IngestError::configuration(format!("time value {s:?} overflows u64")));
        }

        Ok(TimeUnit(value * multiplier))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TimeUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = TimeUnit;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a duration such as \"30s\", \"5m\", \"1h\", \"1d\", \"1w\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TimeUnit, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TimeUnit, E> {
                Ok(TimeUnit(v))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_each_suffix() {
        assert_eq!("30s".parse::<TimeUnit>().unwrap().seconds(), 30);
        assert_eq!("5m".parse::<TimeUnit>().unwrap().seconds(), 300);
        assert_eq!("2h".parse::<TimeUnit>().unwrap().seconds(), 7200);
        assert_eq!("1d".parse::<TimeUnit>().unwrap().seconds(), 86_400);
        assert_eq!("1w".parse::<TimeUnit>().unwrap().seconds(), 604_800);
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!("45".parse::<TimeUnit>().unwrap().seconds(), 45);
    }

    #[test]
    fn zero_is_zero_regardless_of_suffix() {
        assert_eq!("0w".parse::<TimeUnit>().unwrap().seconds(), 0);
    }

    #[test]
    fn rejects_overflow() {
        assert!(format!("{}w", u64::MAX).parse::<TimeUnit>().is_err());
    }
}
