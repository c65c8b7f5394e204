use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use super::fixed_int::{read_u8, read_uint_le, write_u8, write_uint_le};

/// MySQL "length-encoded integer" (a.k.a. packed int), as used in the
/// classic protocol and in several binlog body fields. First byte selects
/// the encoding:
///   `< 251`  -> value is the byte itself
///   `251`    -> reserved "NULL"/max marker, decodes to `u64::MAX`
///   `252`    -> 2 little-endian bytes follow
///   `253`    -> 3 little-endian bytes follow
///   `254`    -> 8 little-endian bytes follow
///   `255`    -> forbidden
const DOUBLE_MARKER: u8 = 252;
const TRIPLE_MARKER: u8 = 253;
const OCTUPLE_MARKER: u8 = 254;
const NULL_MARKER: u8 = 251;
const FORBIDDEN_MARKER: u8 = 255;

pub fn calculate_packed_int_size(value: u64) -> usize {
    if value < NULL_MARKER as u64 {
        1
    } else if value <= u16::MAX as u64 {
        1 + 2
    } else if value <= 0x00FF_FFFF {
        1 + 3
    } else {
        1 + 8
    }
}

pub fn read_packed_int(cursor: &mut Cursor<&[u8]>) -> IngestResult<u64> {
    let first = read_u8(cursor)?;
    match first {
        NULL_MARKER => Ok(u64::MAX),
        DOUBLE_MARKER => read_uint_le(cursor, 2),
        TRIPLE_MARKER => read_uint_le(cursor, 3),
        OCTUPLE_MARKER => read_uint_le(cursor, 8),
        FORBIDDEN_MARKER => Err(IngestError::malformed_frame("packed int first byte 255 is forbidden")),
        small => Ok(small as u64),
    }
}

pub fn write_packed_int(out: &mut Vec<u8>, value: u64) {
    if value < NULL_MARKER as u64 {
        write_u8(out, value as u8);
    } else if value <= u16::MAX as u64 {
        write_u8(out, DOUBLE_MARKER);
        write_uint_le(out, value, 2);
    } else if value <= 0x00FF_FFFF {
        write_u8(out, TRIPLE_MARKER);
        write_uint_le(out, value, 3);
    } else {
        write_u8(out, OCTUPLE_MARKER);
        write_uint_le(out, value, 8);
    }
}
