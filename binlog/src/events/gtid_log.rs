use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use crate::codec::fixed_int::{read_exact, read_i64, read_u32, read_u64, read_u8, read_uint_le};
use crate::codec::read_packed_int;
use crate::gtid::gtid_log_flag::GtidLogFlag;
use crate::gtid::uuid::{self, Uuid};

/// `logical_ts_code` value the protocol always uses today (the only one
/// the reference decoder accepts).
const LOGICAL_TIMESTAMP_TYPECODE: u8 = 2;

/// `gtid_log`/`anonymous_gtid_log` post-header: 42 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtidPostHeader {
    pub flags: GtidLogFlag,
    pub uuid: Uuid,
    pub gno: i64,
    pub last_committed: i64,
    pub sequence_number: i64,
}

impl GtidPostHeader {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        let mut cursor = Cursor::new(bytes);
        let flags_byte = read_u8(&mut cursor)?;
        let flags = GtidLogFlag::from_bits_truncate(flags_byte);
        let uuid_bytes = read_exact(&mut cursor, uuid::ENCODED_LEN)?;
        let uuid = Uuid::from_bytes(uuid_bytes.try_into().expect("16 bytes"));
        let gno = read_i64(&mut cursor)?;
        let logical_ts_code = read_u8(&mut cursor)?;
        if logical_ts_code != LOGICAL_TIMESTAMP_TYPECODE {
            return Err(IngestError::malformed_frame(format!(
                "unsupported logical timestamp typecode: {logical_ts_code}"
            )));
        }
        let last_committed = read_i64(&mut cursor)?;
        let sequence_number = read_i64(&mut cursor)?;
        Ok(GtidPostHeader { flags, uuid, gno, last_committed, sequence_number })
    }
}

/// Mask of the top bit of a 7-byte (56-bit) fixed-width field, used as a
/// presence flag for the optional `original_commit_timestamp`.
const SEVEN_BYTE_PRESENCE_BIT: u64 = 1 << 55;
const FOUR_BYTE_PRESENCE_BIT: u32 = 1 << 31;

/// `gtid_log`/`anonymous_gtid_log` body: extended transaction metadata.
/// Several fields are only present when a presence bit in a preceding
/// field is set, matching the wire encoding MySQL uses to stay backward
/// compatible with shorter, older bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GtidLogBody {
    pub immediate_commit_timestamp: u64,
    pub original_commit_timestamp: Option<u64>,
    pub transaction_length: u64,
    pub original_server_version: Option<u32>,
    pub immediate_server_version: Option<u32>,
    pub commit_group_ticket: Option<u64>,
}

impl GtidLogBody {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        if bytes.is_empty() {
            // older, pre-extension bodies carry none of this; treat as
            // all-absent rather than a hard error.
            return Ok(GtidLogBody::default());
        }

        let mut cursor = Cursor::new(bytes);
        let raw_immediate = read_uint_le(&mut cursor, 7)?;
        let has_original = raw_immediate & SEVEN_BYTE_PRESENCE_BIT != 0;
        let immediate_commit_timestamp = raw_immediate & !SEVEN_BYTE_PRESENCE_BIT;

        let original_commit_timestamp = if has_original {
            Some(read_uint_le(&mut cursor, 7)?)
        } else {
            None
        };

        let transaction_length = read_packed_int(&mut cursor)?;

        let remaining = |c: &Cursor<&[u8]>| bytes.len() as u64 - c.position();

        let (original_server_version, immediate_server_version) = if remaining(&cursor) >= 4 {
            let raw = read_u32(&mut cursor)?;
            let has_immediate = raw & FOUR_BYTE_PRESENCE_BIT != 0;
            let original = raw & !FOUR_BYTE_PRESENCE_BIT;
            let immediate = if has_immediate { Some(read_u32(&mut cursor)?) } else { None };
            (Some(original), immediate)
        } else {
            (None, None)
        };

        let commit_group_ticket =
            if remaining(&cursor) >= 8 { Some(read_u64(&mut cursor)?) } else { None };

        if remaining(&cursor) != 0 {
            return Err(IngestError::malformed_frame("extra bytes in the gtid_log event body"));
        }

        Ok(GtidLogBody {
            immediate_commit_timestamp,
            original_commit_timestamp,
            transaction_length,
            original_server_version,
            immediate_server_version,
            commit_group_ticket,
        })
    }
}
