use nom::bytes::complete::tag;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;
use serde::Serialize;

use crate::event_type::EventType;
use crate::header_flag::EventFlag;

/// Length of the common event header, shared by every binlog event.
pub const COMMON_HEADER_LEN: usize = 19;

/// Magic 4-byte prefix of every binlog file: `0xfe 'b' 'i' 'n'`.
pub const BINLOG_MAGIC: [u8; 4] = [0xFE, b'b', b'i', b'n'];

/// The 19-byte prefix shared by every binlog event.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct Header {
    pub timestamp: u32,
    pub event_type: EventType,
    pub server_id: u32,
    pub event_size: u32,
    pub next_event_position: u32,
    pub flags: EventFlag,
}

impl Header {
    pub fn check_start(i: &[u8]) -> IResult<&[u8], &[u8]> {
        tag(&BINLOG_MAGIC[..])(i)
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], RawHeader> {
        let (i, timestamp) = le_u32(input)?;
        let (i, event_type_code) = le_u8(i)?;
        let (i, server_id) = le_u32(i)?;
        let (i, event_size) = le_u32(i)?;
        let (i, next_event_position) = le_u32(i)?;
        let (i, flags_bits) = le_u16(i)?;

        Ok((
            i,
            RawHeader { timestamp, event_type_code, server_id, event_size, next_event_position, flags_bits },
        ))
    }

    pub fn is_artificial(&self) -> bool {
        self.flags.contains(EventFlag::ARTIFICIAL_F)
    }
}

/// Intermediate parse result before the event type code and flag bits have
/// been validated into their richer [`EventType`]/[`EventFlag`] forms --
/// kept separate so a malformed flag bit doesn't abort the nom combinator
/// chain before we've had a chance to turn it into a descriptive error.
#[derive(Debug, Clone, Copy)]
pub struct RawHeader {
    pub timestamp: u32,
    pub event_type_code: u8,
    pub server_id: u32,
    pub event_size: u32,
    pub next_event_position: u32,
    pub flags_bits: u16,
}

impl RawHeader {
    pub fn into_header(self) -> common::err::IngestResult<Header> {
        let event_type = EventType::from_code(self.event_type_code)?;
        let flags = EventFlag::from_bits_truncate(self.flags_bits);
        Ok(Header {
            timestamp: self.timestamp,
            event_type,
            server_id: self.server_id,
            event_size: self.event_size,
            next_event_position: self.next_event_position,
            flags,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1_700_000_000u32.to_le_bytes()); // timestamp
        bytes.push(4); // rotate
        bytes.extend_from_slice(&42u32.to_le_bytes()); // server_id
        bytes.extend_from_slice(&30u32.to_le_bytes()); // event_size
        bytes.extend_from_slice(&4u32.to_le_bytes()); // next_event_position
        bytes.extend_from_slice(&0x0020u16.to_le_bytes()); // ARTIFICIAL_F
        bytes
    }

    #[test]
    fn parses_common_header() {
        let bytes = sample_bytes();
        let (rest, raw) = Header::parse(&bytes).unwrap();
        assert!(rest.is_empty());
        let header = raw.into_header().unwrap();
        assert_eq!(header.event_type, EventType::Rotate);
        assert_eq!(header.server_id, 42);
        assert_eq!(header.event_size, 30);
        assert_eq!(header.next_event_position, 4);
        assert!(header.is_artificial());
    }

    #[test]
    fn check_start_matches_magic() {
        assert!(Header::check_start(&BINLOG_MAGIC).is_ok());
        assert!(Header::check_start(&[0, 1, 2, 3]).is_err());
    }
}
