use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use crate::codec::{read_varlen_int, read_varlen_uint};
use crate::gtid::gtid_log_flag::GtidLogFlag;
use crate::gtid::tag::Tag;
use crate::gtid::uuid::Uuid;

/// The only `serialization_version` this decoder understands.
const SUPPORTED_SERIALIZATION_VERSION: u64 = 1;

/// One past the highest recognized `field_id`; anything at or above this
/// is rejected rather than silently skipped, matching the reference (the
/// "ignorable tail" only covers *known, newer* fields beyond
/// `last_non_ignorable_field_id`, not genuinely unknown ones).
const FIELD_ID_DELIMITER: u64 = 12;

/// `gtid_tagged_log` body: a self-describing, tag-value framed extension
/// of the classic `gtid_log` body that additionally carries a GTID tag.
/// Field order on the wire is not fixed -- each field is prefixed with its
/// own id -- but ids must increase strictly, and the "non-ignorable"
/// prefix (ids `<= last_non_ignorable_field_id`) must be gap-free from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtidTaggedLogBody {
    pub flags: GtidLogFlag,
    pub uuid: Option<Uuid>,
    pub gno: Option<i64>,
    pub tag: Tag,
    pub last_committed: Option<i64>,
    pub sequence_number: Option<i64>,
    pub immediate_commit_timestamp: Option<u64>,
    pub original_commit_timestamp: Option<u64>,
    pub transaction_length: Option<u64>,
    pub immediate_server_version: Option<u32>,
    pub original_server_version: Option<u32>,
    pub commit_group_ticket: Option<u64>,
}

impl GtidTaggedLogBody {
    pub fn decode(bytes: &[u8]) -> IngestResult<Self> {
        let mut cursor = Cursor::new(bytes);

        let serialization_version = read_varlen_uint(&mut cursor)?;
        if serialization_version != SUPPORTED_SERIALIZATION_VERSION {
            return Err(IngestError::malformed_frame(format!(
                "unsupported gtid_tagged_log serialization version: {serialization_version}"
            )));
        }

        let serializable_field_size = read_varlen_uint(&mut cursor)?;
        if serializable_field_size != bytes.len() as u64 {
            return Err(IngestError::malformed_frame(format!(
                "invalid serializable_field_size: {serializable_field_size} != body length {}",
                bytes.len()
            )));
        }

        let last_non_ignorable_field_id = read_varlen_uint(&mut cursor)?;

        let mut body = GtidTaggedLogBody::default();
        let mut last_seen_field_id: Option<u64> = None;

        while (cursor.position() as usize) < bytes.len() {
            let field_id = read_varlen_uint(&mut cursor)?;

            if let Some(last) = last_seen_field_id {
                if field_id <= last {
                    return Err(IngestError::malformed_frame("broken field_id sequence"));
                }
            }

            if field_id <= last_non_ignorable_field_id {
                let expected = last_seen_field_id.map(|last| last + 1).unwrap_or(0);
                if field_id != expected {
                    return Err(IngestError::malformed_frame(
                        "violated last_non_ignorable_field_id rule",
                    ));
                }
            }

            body.apply_field(field_id, &mut cursor)?;
            last_seen_field_id = Some(field_id);
        }

        Ok(body)
    }

    fn apply_field(&mut self, field_id: u64, cursor: &mut Cursor<&[u8]>) -> IngestResult<()> {
        match field_id {
            0 => {
                let raw = read_varlen_uint(cursor)?;
                self.flags = GtidLogFlag::from_bits_truncate(raw as u8);
            }
            1 => {
                let mut raw = [0u8; 16];
                for byte in raw.iter_mut() {
                    *byte = read_varlen_uint(cursor)? as u8;
                }
                self.uuid = Some(Uuid::from_bytes(raw));
            }
            2 => self.gno = Some(read_varlen_int(cursor)?),
            3 => self.tag = Tag::decode_from(cursor)?,
            4 => self.last_committed = Some(read_varlen_int(cursor)?),
            5 => self.sequence_number = Some(read_varlen_int(cursor)?),
            6 => self.immediate_commit_timestamp = Some(read_varlen_uint(cursor)?),
            7 => self.original_commit_timestamp = Some(read_varlen_uint(cursor)?),
            8 => self.transaction_length = Some(read_varlen_uint(cursor)?),
            9 => self.immediate_server_version = Some(read_varlen_uint(cursor)? as u32),
            10 => self.original_server_version = Some(read_varlen_uint(cursor)? as u32),
            11 => self.commit_group_ticket = Some(read_varlen_uint(cursor)?),
            other if other >= FIELD_ID_DELIMITER => {
                return Err(IngestError::malformed_frame(format!("unknown field_id: {other}")))
            }
            other => {
                return Err(IngestError::malformed_frame(format!("unhandled field_id: {other}")))
            }
        }
        Ok(())
    }
}
