use common::err::{IngestError, IngestResult};
use tracing::debug;

use crate::checksum_type::ChecksumType;
use crate::event_type::EventType;
use crate::events::post_header_len::UNSPECIFIED;
use crate::events::{post_header_len, Body, ParsedEvent, PostHeader};
use crate::gtid::gtid::Gtid;
use crate::gtid::gtid_set::GtidSet;
use crate::gtid::tag::Tag;

/// Absolute offset the first real event in any binlog file sits at, right
/// after the 4-byte magic -- every artificial rotate's post-header must
/// declare this as the "new file" position.
pub const MAGIC_BINLOG_OFFSET: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    RotateArtificialExpected,
    FormatDescriptionExpected,
    PreviousGtidsExpected,
    GtidLogExpected,
    AnyOtherExpected,
    RotateOrStopExpected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FdeState {
    post_header_lengths: Vec<u8>,
    checksum_type: ChecksumType,
}

/// Effect a processed event has beyond "advance position" -- handed back
/// to the driver loop so storage/GTID bookkeeping stays out of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderOutcome {
    SeedGtidSet(GtidSet),
    TransactionBegin(Gtid),
    TransactionEnd(Gtid),
    None,
}

/// Tracks replication protocol state across a sequence of binlog events:
/// which state the reader is in, the post-header-length table and
/// checksum algorithm declared by the last format_description event, the
/// current byte position within the binlog file, and open-transaction
/// bookkeeping. Owned exclusively by the driver loop by the driver loop.
#[derive(Debug, Clone)]
pub struct ReaderContext {
    state: ReaderState,
    gtid_mode: bool,
    verify_checksum: bool,
    fde: Option<FdeState>,
    position: u64,
    current_transaction: Option<Gtid>,
    expected_transaction_length: u64,
    current_transaction_length: u64,
}

impl ReaderContext {
    pub fn new(gtid_mode: bool, verify_checksum: bool) -> Self {
        ReaderContext {
            state: ReaderState::RotateArtificialExpected,
            gtid_mode,
            verify_checksum,
            fde: None,
            position: 0,
            current_transaction: None,
            expected_transaction_length: 0,
            current_transaction_length: 0,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn has_fde_processed(&self) -> bool {
        self.fde.is_some()
    }

    pub fn verify_checksum(&self) -> bool {
        self.verify_checksum
    }

    pub fn current_checksum_type(&self) -> ChecksumType {
        self.fde.as_ref().map(|f| f.checksum_type).unwrap_or(ChecksumType::Off)
    }

    /// Post-header length declared for `code` by the last format_description
    /// event, or `None` if no FDE has been processed yet or `code` is out of
    /// range for its table.
    pub fn post_header_len_for(&self, code: u8) -> Option<u8> {
        if code == 0 {
            return None;
        }
        self.fde.as_ref().and_then(|f| f.post_header_lengths.get(code as usize - 1).copied())
    }

    pub fn current_transaction(&self) -> Option<&Gtid> {
        self.current_transaction.as_ref()
    }

    /// Runs one event through the state machine, validating position
    /// discipline and legal event ordering, and returns the effect the
    /// caller should apply to storage/GTID state.
    pub fn process_event(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        // Artificial rotate is a file-boundary marker, not a normal
        // in-sequence event: wherever it shows up (except when we're
        // already expecting the very first one), it resets us back to the
        // initial state and gets reprocessed from there.
        if event.is_artificial_rotate() && self.state != ReaderState::RotateArtificialExpected {
            self.state = ReaderState::RotateArtificialExpected;
            self.position = 0;
        }

        match self.state {
            ReaderState::RotateArtificialExpected => self.process_rotate_artificial_expected(event),
            ReaderState::FormatDescriptionExpected => self.process_format_description_expected(event),
            ReaderState::PreviousGtidsExpected => self.process_previous_gtids_expected(event),
            ReaderState::GtidLogExpected => self.process_gtid_log_expected(event),
            ReaderState::AnyOtherExpected => self.process_any_other_expected(event),
            ReaderState::RotateOrStopExpected => Err(IngestError::protocol_violation(
                "only an artificial rotate may follow a stop/rotate event",
            )),
        }
    }

    fn process_rotate_artificial_expected(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        if !event.is_artificial_rotate() {
            return Err(IngestError::protocol_violation(
                "expected an artificial rotate event at the start of the file",
            ));
        }
        if event.header.timestamp != 0 {
            return Err(IngestError::protocol_violation("artificial rotate must carry a zero timestamp"));
        }
        if event.header.next_event_position != 0 {
            return Err(IngestError::protocol_violation(
                "artificial rotate must carry a zero next event position",
            ));
        }
        if self.position != 0 {
            return Err(IngestError::protocol_violation("artificial rotate seen with non-zero position"));
        }

        let rotate_position = match &event.post_header {
            PostHeader::Rotate(h) => h.position,
            _ => return Err(IngestError::malformed_frame("rotate event missing its post-header")),
        };
        if rotate_position != MAGIC_BINLOG_OFFSET {
            return Err(IngestError::protocol_violation(format!(
                "artificial rotate must position the reader at {MAGIC_BINLOG_OFFSET}, got {rotate_position}"
            )));
        }

        self.position = rotate_position;
        self.state = ReaderState::FormatDescriptionExpected;
        debug!(position = self.position, "artificial rotate processed");
        Ok(ReaderOutcome::None)
    }

    fn process_format_description_expected(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        if event.header.event_type != EventType::FormatDescription {
            return Err(IngestError::protocol_violation(
                "expected a format_description event to follow the artificial rotate",
            ));
        }
        let post_header = match &event.post_header {
            PostHeader::FormatDescription(h) => h,
            _ => return Err(IngestError::malformed_frame("format_description event missing its post-header")),
        };
        let body = match &event.body {
            Body::FormatDescription(b) => b,
            _ => return Err(IngestError::malformed_frame("format_description event missing its body")),
        };

        if post_header.binlog_version != crate::events::format_description::DEFAULT_BINLOG_VERSION {
            return Err(IngestError::protocol_violation(format!(
                "unsupported binlog_version: {}",
                post_header.binlog_version
            )));
        }
        if post_header.common_header_length != crate::events::format_description::DEFAULT_COMMON_HEADER_LENGTH {
            return Err(IngestError::protocol_violation(format!(
                "unsupported common_header_length: {}",
                post_header.common_header_length
            )));
        }
        self.validate_post_header_lengths(&post_header.post_header_lengths)?;

        self.fde = Some(FdeState {
            post_header_lengths: post_header.post_header_lengths.clone(),
            checksum_type: body.checksum_algorithm,
        });

        if !event.is_artificial_rotate() && event.header.next_event_position != 0 {
            self.advance_position(event)?;
        }

        self.state =
            if self.gtid_mode { ReaderState::PreviousGtidsExpected } else { ReaderState::AnyOtherExpected };
        Ok(ReaderOutcome::None)
    }

    /// Every real entry the current format_description declares must match
    /// the hard-coded expectation; `UNSPECIFIED` in the expectation table
    /// is a wildcard (newer event types this crate doesn't pin a length for).
    fn validate_post_header_lengths(&self, declared: &[u8]) -> IngestResult<()> {
        for (index, &declared_len) in declared.iter().enumerate() {
            let code = index as u8 + 1;
            let Ok(event_type) = EventType::from_code(code) else { continue };
            let expected = post_header_len::expected_post_header_len(event_type);
            if expected != UNSPECIFIED && expected != declared_len {
                return Err(IngestError::protocol_violation(format!(
                    "format_description declares post-header length {declared_len} for event code {code}, expected {expected}"
                )));
            }
        }
        Ok(())
    }

    fn process_previous_gtids_expected(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        if event.header.event_type != EventType::PreviousGtidsLog {
            return Err(IngestError::protocol_violation(
                "expected a previous_gtids_log event in GTID mode",
            ));
        }
        self.advance_position(event)?;
        let gtid_set = match &event.body {
            Body::PreviousGtidsLog(b) => b.gtid_set.clone(),
            _ => return Err(IngestError::malformed_frame("previous_gtids_log event missing its body")),
        };
        self.state = ReaderState::GtidLogExpected;
        Ok(ReaderOutcome::SeedGtidSet(gtid_set))
    }

    fn process_gtid_log_expected(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        if !matches!(
            event.header.event_type,
            EventType::AnonymousGtidLog | EventType::GtidLog | EventType::GtidTaggedLog
        ) {
            return Err(IngestError::protocol_violation(
                "expected a gtid-opening event (anonymous_gtid_log/gtid_log/gtid_tagged_log)",
            ));
        }
        self.advance_position(event)?;

        let (gtid, expected_len) = self.extract_transaction_start(event)?;
        self.current_transaction = Some(gtid.clone());
        self.expected_transaction_length = expected_len;
        self.current_transaction_length = 0;
        self.state = ReaderState::AnyOtherExpected;
        Ok(ReaderOutcome::TransactionBegin(gtid))
    }

    fn extract_transaction_start(&self, event: &ParsedEvent) -> IngestResult<(Gtid, u64)> {
        match (&event.post_header, &event.body) {
            (PostHeader::Gtid(header), Body::GtidLog(body)) => {
                let gtid = Gtid::new(header.uuid, Tag::empty(), header.gno as u64)?;
                Ok((gtid, body.transaction_length))
            }
            (_, Body::GtidTaggedLog(body)) => {
                let uuid = body
                    .uuid
                    .ok_or_else(|| IngestError::malformed_frame("gtid_tagged_log missing uuid field"))?;
                let gno = body
                    .gno
                    .ok_or_else(|| IngestError::malformed_frame("gtid_tagged_log missing gno field"))?;
                let gtid = Gtid::new(uuid, body.tag.clone(), gno as u64)?;
                Ok((gtid, body.transaction_length.unwrap_or(0)))
            }
            _ => Err(IngestError::malformed_frame("gtid-opening event missing its decoded payload")),
        }
    }

    fn process_any_other_expected(&mut self, event: &ParsedEvent) -> IngestResult<ReaderOutcome> {
        if event.header.event_type == EventType::FormatDescription {
            return Err(IngestError::protocol_violation(
                "a second format_description event is not allowed within one file",
            ));
        }
        if event.is_artificial_rotate() {
            return Err(IngestError::protocol_violation(
                "an artificial rotate is only expected at a file boundary",
            ));
        }

        if event.header.event_type == EventType::Rotate {
            let rotate_position = match &event.post_header {
                PostHeader::Rotate(h) => h.position,
                _ => return Err(IngestError::malformed_frame("rotate event missing its post-header")),
            };
            if rotate_position != MAGIC_BINLOG_OFFSET {
                return Err(IngestError::protocol_violation(format!(
                    "real rotate must declare position {MAGIC_BINLOG_OFFSET}, got {rotate_position}"
                )));
            }
        }

        self.advance_position(event)?;

        let outcome = self.accumulate_transaction_length(event);

        if matches!(event.header.event_type, EventType::Stop | EventType::Rotate) {
            self.state = ReaderState::RotateOrStopExpected;
        }

        Ok(outcome)
    }

    fn accumulate_transaction_length(&mut self, event: &ParsedEvent) -> ReaderOutcome {
        let Some(gtid) = self.current_transaction.clone() else {
            return ReaderOutcome::None;
        };
        self.current_transaction_length += event.header.event_size as u64;
        if self.expected_transaction_length != 0
            && self.current_transaction_length >= self.expected_transaction_length
        {
            self.current_transaction = None;
            self.expected_transaction_length = 0;
            self.current_transaction_length = 0;
            ReaderOutcome::TransactionEnd(gtid)
        } else {
            ReaderOutcome::None
        }
    }

    /// Enforces `position + event_size == next_event_position` for every
    /// non-pseudo event, then advances `position` to match.
    fn advance_position(&mut self, event: &ParsedEvent) -> IngestResult<()> {
        let expected_next = self.position + event.header.event_size as u64;
        if expected_next != event.header.next_event_position as u64 {
            return Err(IngestError::protocol_violation(format!(
                "position discipline violated: {} + {} != {}",
                self.position, event.header.event_size, event.header.next_event_position
            )));
        }
        self.position = expected_next;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_in_rotate_artificial_expected_with_zero_position() {
        let context = ReaderContext::new(false, true);
        assert_eq!(context.state(), ReaderState::RotateArtificialExpected);
        assert_eq!(context.position(), 0);
        assert!(!context.has_fde_processed());
    }

    #[test]
    fn unknown_post_header_len_lookup_before_fde_is_none() {
        let context = ReaderContext::new(false, true);
        assert_eq!(context.post_header_len_for(4), None);
    }
}
