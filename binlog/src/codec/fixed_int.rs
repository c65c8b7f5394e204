use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use common::err::{IngestError, IngestResult};

/// Reads up to 8 little-endian bytes into a `u64`. Mirrors the reference
/// implementation's "fixed int with a partial byte count" extractor used by
/// the packed- and varlen-int codecs below.
pub fn read_uint_le(cursor: &mut Cursor<&[u8]>, bytes: usize) -> IngestResult<u64> {
    if bytes == 0 {
        return Ok(0);
    }
    cursor
        .read_uint::<LittleEndian>(bytes)
        .map_err(|e| IngestError::malformed_frame(format!("truncated fixed int ({bytes} bytes): {e}")))
}

pub fn write_uint_le(out: &mut Vec<u8>, value: u64, bytes: usize) {
    if bytes == 0 {
        return;
    }
    let full = value.to_le_bytes();
    out.extend_from_slice(&full[..bytes]);
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> IngestResult<u8> {
    cursor.read_u8().map_err(|e| IngestError::malformed_frame(format!("truncated u8: {e}")))
}

pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    // infallible: writing to a Vec<u8> never fails
    let _ = out.write_u8(value);
}

pub fn read_u16(cursor: &mut Cursor<&[u8]>) -> IngestResult<u16> {
    cursor.read_u16::<LittleEndian>().map_err(|e| IngestError::malformed_frame(format!("truncated u16: {e}")))
}

pub fn read_u32(cursor: &mut Cursor<&[u8]>) -> IngestResult<u32> {
    cursor.read_u32::<LittleEndian>().map_err(|e| IngestError::malformed_frame(format!("truncated u32: {e}")))
}

pub fn read_u64(cursor: &mut Cursor<&[u8]>) -> IngestResult<u64> {
    cursor.read_u64::<LittleEndian>().map_err(|e| IngestError::malformed_frame(format!("truncated u64: {e}")))
}

pub fn read_i64(cursor: &mut Cursor<&[u8]>) -> IngestResult<i64> {
    cursor.read_i64::<LittleEndian>().map_err(|e| IngestError::malformed_frame(format!("truncated i64: {e}")))
}

pub fn read_exact(cursor: &mut Cursor<&[u8]>, len: usize) -> IngestResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    std::io::Read::read_exact(cursor, &mut buf)
        .map_err(|e| IngestError::malformed_frame(format!("truncated {len}-byte span: {e}")))?;
    Ok(buf)
}
