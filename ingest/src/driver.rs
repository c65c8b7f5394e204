use tracing::{info, warn};

use binlog::event_type::EventType;
use binlog::events::{parse_and_process, Body};
use binlog::reader_context::{ReaderContext, ReaderOutcome};
use common::err::IngestResult;
use storage::Storage;

use crate::source::EventSource;

/// Wires one [`EventSource`] through a [`ReaderContext`] into a [`Storage`]
/// engine: the cooperative single-threaded pull loop. Both the reader
/// context and the storage object are owned exclusively here.
pub struct Driver<S: EventSource> {
    source: S,
    context: ReaderContext,
    storage: Storage,
}

impl<S: EventSource> Driver<S> {
    pub fn new(source: S, context: ReaderContext, storage: Storage) -> Self {
        Driver { source, context, storage }
    }

    /// Runs until the source cleanly ends, writing every validated event to
    /// storage. Any parse/protocol/backend error aborts the loop and is
    /// returned to the caller; no error is retried inside the core.
    pub fn run(&mut self) -> IngestResult<()> {
        while let Some(bytes) = self.source.next_event()? {
            self.process_one(&bytes)?;
        }
        info!("event source reached end of stream");
        Ok(())
    }

    fn process_one(&mut self, bytes: &[u8]) -> IngestResult<()> {
        let (event, outcome) = parse_and_process(&mut self.context, bytes)?;

        match &outcome {
            ReaderOutcome::SeedGtidSet(set) => {
                self.storage.seed_gtid_set(set.clone());
            }
            ReaderOutcome::TransactionBegin(gtid) => {
                info!(%gtid, "transaction begin");
            }
            ReaderOutcome::TransactionEnd(gtid) => {
                self.storage.record_completed_gtid(gtid);
                info!(%gtid, "transaction end");
            }
            ReaderOutcome::None => {}
        }

        if event.is_artificial_rotate() {
            // Pseudo event: synthesized by the server, not part of the
            // real file -- announces the name we're (re)opening but is
            // never itself written to storage.
            let name = rotate_target_name(&event.body)?;
            self.open_or_resume(&name)?;
            return Ok(());
        }

        self.storage.write_event(&event.raw)?;

        if event.header.event_type == EventType::Rotate {
            let name = rotate_target_name(&event.body)?;
            self.storage.close_binlog()?;
            self.storage.open_binlog(&name)?;
        }

        Ok(())
    }

    fn open_or_resume(&mut self, name: &str) -> IngestResult<()> {
        if self.storage.is_binlog_open() {
            if self.storage.current_binlog_name() == Some(name) {
                warn!(name, "artificial rotate re-announced the already-open binlog");
                return Ok(());
            }
            self.storage.close_binlog()?;
        }
        self.storage.open_binlog(name)
    }
}

fn rotate_target_name(body: &Body) -> IngestResult<String> {
    match body {
        Body::Rotate(rotate) => Ok(rotate.name_lossy().into_owned()),
        _ => Err(common::err::IngestError::malformed_frame("rotate event missing its decoded body")),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use binlog::checksum_type::ChecksumType;
    use binlog::event_type::EventType as Ty;
    use binlog::events::post_header_len;
    use binlog::header_flag::EventFlag;
    use common::config::StorageConfig;
    use common::units::{SizeUnit, TimeUnit};
    use storage::ReplicationMode;
    use tempfile::tempdir;

    fn header(event_type: Ty, next_position: u32, flags: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(event_type.code());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // event_size, patched below
        bytes.extend_from_slice(&next_position.to_le_bytes());
        bytes.extend_from_slice(&flags.to_le_bytes());
        bytes
    }

    /// The full per-event-type post-header length table this crate expects,
    /// so a hand-built format_description event round-trips its own
    /// self-consistency check (reader_context::validate_post_header_lengths).
    fn full_post_header_table() -> Vec<u8> {
        (1u8..=42).map(|code| post_header_len::expected_post_header_len(Ty::from_code(code).unwrap())).collect()
    }

    fn fde_event() -> Vec<u8> {
        let mut event = header(Ty::FormatDescription, 0, 0);
        event.extend_from_slice(&4u16.to_le_bytes()); // binlog_version
        event.extend_from_slice(&[0u8; 50]); // server_version
        event.extend_from_slice(&0u32.to_le_bytes()); // create_timestamp
        event.push(19); // common_header_length
        event.extend_from_slice(&full_post_header_table());
        event.push(ChecksumType::Off as u8); // body: checksum_algorithm
        event.extend_from_slice(&[0u8; 4]); // footer: always present for FDE
        patch_event_size(&mut event);
        event
    }

    fn artificial_rotate_event() -> Vec<u8> {
        let mut event = header(Ty::Rotate, 0, EventFlag::ARTIFICIAL_F.bits());
        event.extend_from_slice(&4u64.to_le_bytes());
        event.extend_from_slice(b"binlog.000001");
        patch_event_size(&mut event);
        event
    }

    fn patch_event_size(event: &mut [u8]) {
        let size = (event.len() as u32).to_le_bytes();
        event[9..13].copy_from_slice(&size);
    }

    #[test]
    fn happy_path_opens_binlog_and_writes_the_format_description() {
        let dir = tempdir().unwrap();
        let storage_config = StorageConfig {
            uri: format!("file://{}", dir.path().display()),
            checkpoint_size: SizeUnit(0),
            checkpoint_interval: TimeUnit(0),
        };
        let storage = Storage::open(&storage_config, ReplicationMode::Position).unwrap();
        let context = ReaderContext::new(false, false);

        let rotate = artificial_rotate_event();
        let fde = fde_event();
        let fde_len = fde.len() as u64;

        let mut driver = Driver::new(ReplayEventSourceStub::new(vec![rotate, fde]), context, storage);
        driver.run().unwrap();

        assert!(driver.storage.is_binlog_open());
        assert_eq!(driver.storage.current_binlog_name(), Some("binlog.000001"));
        assert_eq!(driver.storage.position(), 4 + fde_len);
    }

    struct ReplayEventSourceStub {
        events: std::vec::IntoIter<Vec<u8>>,
    }

    impl ReplayEventSourceStub {
        fn new(events: Vec<Vec<u8>>) -> Self {
            ReplayEventSourceStub { events: events.into_iter() }
        }
    }

    impl EventSource for ReplayEventSourceStub {
        fn next_event(&mut self) -> IngestResult<Option<Vec<u8>>> {
            Ok(self.events.next())
        }
    }
}
