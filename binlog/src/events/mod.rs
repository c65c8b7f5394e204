pub mod footer;
pub mod format_description;
pub mod gtid_log;
pub mod gtid_tagged_log;
pub mod opaque;
pub mod post_header_len;
pub mod previous_gtids_log;
pub mod rotate;

use common::err::{IngestError, IngestResult};
use tracing::trace;

use crate::checksum_type::ChecksumType;
use crate::codec::crc32;
use crate::event_type::EventType;
use crate::header::{Header, COMMON_HEADER_LEN};
use crate::header_flag::EventFlag;
use crate::reader_context::ReaderContext;

pub use footer::Footer;
pub use format_description::{FormatDescriptionBody, FormatDescriptionPostHeader};
pub use gtid_log::{GtidLogBody, GtidPostHeader};
pub use gtid_tagged_log::GtidTaggedLogBody;
pub use opaque::Opaque;
pub use previous_gtids_log::PreviousGtidsLogBody;
pub use rotate::{RotateBody, RotatePostHeader};

/// Decoded post-header, one variant per structurally-decoded event type;
/// everything else shares [`Opaque`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostHeader {
    Rotate(RotatePostHeader),
    FormatDescription(FormatDescriptionPostHeader),
    Gtid(GtidPostHeader),
    Opaque(Opaque),
}

/// Decoded body, one variant per structurally-decoded event type;
/// everything else shares [`Opaque`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    FormatDescription(FormatDescriptionBody),
    Rotate(RotateBody),
    GtidLog(GtidLogBody),
    GtidTaggedLog(GtidTaggedLogBody),
    PreviousGtidsLog(PreviousGtidsLogBody),
    Opaque(Opaque),
}

/// One fully decoded binlog event: common header, post-header, body, and
/// optional footer, plus the raw bytes it was parsed from (storage writes
/// these verbatim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub header: Header,
    pub post_header: PostHeader,
    pub body: Body,
    pub footer: Option<Footer>,
    pub raw: Vec<u8>,
}

impl ParsedEvent {
    pub fn is_artificial_rotate(&self) -> bool {
        self.header.event_type == EventType::Rotate && self.header.is_artificial()
    }
}

/// Parses exactly one event out of `bytes`, using `context` only to look
/// up the currently-governing post-header-length table, checksum
/// algorithm, and checksum-verification policy. Does not mutate `context`
/// or run the reader state machine -- see [`crate::reader_context`] for
/// that, and [`parse_and_process`] for the combined call most callers want.
pub fn parse_event(context: &ReaderContext, bytes: &[u8]) -> IngestResult<ParsedEvent> {
    if bytes.len() < COMMON_HEADER_LEN {
        return Err(IngestError::malformed_frame("not enough data for event common header"));
    }
    let (_, raw_header) =
        Header::parse(bytes).map_err(|e| IngestError::malformed_frame(format!("bad common header: {e}")))?;
    let header = raw_header.into_header()?;

    let event_size = header.event_size as usize;
    if event_size != bytes.len() {
        return Err(IngestError::malformed_frame(
            "actual event size does not match the one specified in the common header",
        ));
    }

    let footer_size = determine_footer_size(context, &header);
    let post_header_size = determine_post_header_size(context, &header)?;

    let group_size = COMMON_HEADER_LEN + post_header_size + footer_size;
    if event_size < group_size {
        return Err(IngestError::malformed_frame("not enough data for post-header + body + footer"));
    }
    let body_size = event_size - group_size;

    let post_header_bytes = &bytes[COMMON_HEADER_LEN..COMMON_HEADER_LEN + post_header_size];
    let body_bytes = &bytes[COMMON_HEADER_LEN + post_header_size..COMMON_HEADER_LEN + post_header_size + body_size];

    let post_header = decode_post_header(header.event_type, post_header_bytes)?;
    let body = decode_body(header.event_type, body_bytes)?;

    let footer = if footer_size != 0 {
        let footer_bytes = &bytes[COMMON_HEADER_LEN + post_header_size + body_size..];
        let footer = Footer::decode(footer_bytes)?;
        if context.verify_checksum() {
            let computed = crc32(&bytes[..event_size - footer_size]);
            if computed != footer.crc {
                return Err(IngestError::protocol_violation(format!(
                    "checksum mismatch: computed {computed:#x}, footer says {:#x}",
                    footer.crc
                )));
            }
        }
        Some(footer)
    } else {
        None
    };

    trace!(event_type = ?header.event_type, event_size, "decoded binlog event");

    Ok(ParsedEvent { header, post_header, body, footer, raw: bytes.to_vec() })
}

/// Runs [`parse_event`] and then feeds the result through the reader
/// context's state machine, returning both the decoded event and the
/// outcome the caller (driver loop / storage engine) should act on.
pub fn parse_and_process(
    context: &mut ReaderContext,
    bytes: &[u8],
) -> IngestResult<(ParsedEvent, crate::reader_context::ReaderOutcome)> {
    let event = parse_event(context, bytes)?;
    let outcome = context.process_event(&event)?;
    Ok((event, outcome))
}

fn determine_footer_size(context: &ReaderContext, header: &Header) -> usize {
    if header.event_type == EventType::FormatDescription {
        // FDEs always carry a footer with a checksum, regardless of what
        // algorithm they themselves declare.
        footer::FOOTER_LEN
    } else if context.has_fde_processed() {
        context.current_checksum_type().footer_len()
    } else {
        0
    }
}

fn determine_post_header_size(context: &ReaderContext, header: &Header) -> IngestResult<usize> {
    if context.has_fde_processed() {
        let len = context
            .post_header_len_for(header.event_type.code())
            .ok_or_else(|| IngestError::malformed_frame("event type unknown to current format_description"))?;
        if len == post_header_len::UNSPECIFIED {
            return Err(IngestError::malformed_frame(
                "event type not present in current format_description's post-header table",
            ));
        }
        Ok(len as usize)
    } else {
        match header.event_type {
            EventType::Rotate => {
                if !header.flags.contains(EventFlag::ARTIFICIAL_F) {
                    return Err(IngestError::protocol_violation(
                        "rotate event without a preceding format_description event must have the artificial flag set",
                    ));
                }
            }
            EventType::FormatDescription => {}
            _ => {
                return Err(IngestError::protocol_violation(
                    "this event type must be preceded by a format_description event",
                ))
            }
        }
        Ok(post_header_len::expected_post_header_len(header.event_type) as usize)
    }
}

fn decode_post_header(event_type: EventType, bytes: &[u8]) -> IngestResult<PostHeader> {
    Ok(match event_type {
        EventType::Rotate => PostHeader::Rotate(RotatePostHeader::decode(bytes)?),
        EventType::FormatDescription => PostHeader::FormatDescription(FormatDescriptionPostHeader::decode(bytes)?),
        EventType::GtidLog | EventType::AnonymousGtidLog => PostHeader::Gtid(GtidPostHeader::decode(bytes)?),
        _ => PostHeader::Opaque(Opaque::decode(bytes)),
    })
}

fn decode_body(event_type: EventType, bytes: &[u8]) -> IngestResult<Body> {
    Ok(match event_type {
        EventType::FormatDescription => Body::FormatDescription(FormatDescriptionBody::decode(bytes)?),
        EventType::Rotate => Body::Rotate(RotateBody::decode(bytes)?),
        EventType::GtidLog | EventType::AnonymousGtidLog => Body::GtidLog(GtidLogBody::decode(bytes)?),
        EventType::GtidTaggedLog => Body::GtidTaggedLog(GtidTaggedLogBody::decode(bytes)?),
        EventType::PreviousGtidsLog => Body::PreviousGtidsLog(PreviousGtidsLogBody::decode(bytes)?),
        _ => Body::Opaque(Opaque::decode(bytes)),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn common_header_bytes(event_type: u8, event_size: u32, next_position: u32, flags: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        bytes.push(event_type);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&event_size.to_le_bytes());
        bytes.extend_from_slice(&next_position.to_le_bytes());
        bytes.extend_from_slice(&flags.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_artificial_rotate_before_any_fde() {
        let mut event = common_header_bytes(4, 0, 0, 0x0020);
        event.extend_from_slice(&4u64.to_le_bytes()); // rotate post-header: position
        event.extend_from_slice(b"binlog.000001");
        let size_bytes = (event.len() as u32).to_le_bytes();
        event[9..13].copy_from_slice(&size_bytes);

        let context = ReaderContext::new(false, true);
        let parsed = parse_event(&context, &event).unwrap();
        assert!(parsed.is_artificial_rotate());
        match parsed.post_header {
            PostHeader::Rotate(h) => assert_eq!(h.position, 4),
            _ => panic!("expected rotate post-header"),
        }
    }

    #[test]
    fn rejects_non_pseudo_event_before_fde() {
        let mut event = common_header_bytes(2, 0, 0, 0); // query, no FDE seen yet
        event.extend_from_slice(&[0u8; 4]);
        let size_bytes = (event.len() as u32).to_le_bytes();
        event[9..13].copy_from_slice(&size_bytes);

        let context = ReaderContext::new(false, true);
        let err = parse_event(&context, &event).unwrap_err();
        assert!(err.is_protocol_violation());
    }
}
