use std::time::{Duration, Instant};

use tracing::{debug, info};

use binlog::gtid::gtid::Gtid;
use binlog::gtid::gtid_set::GtidSet;
use common::config::StorageConfig;
use common::err::{IngestError, IngestResult};

use crate::backend::{open_backend, StorageBackend, StreamMode};
use crate::index::{self, BINLOG_INDEX_NAME, METADATA_NAME};
use crate::metadata::{ReplicationMode, StorageMetadata};

/// The absolute offset the first real event in any binlog file sits at,
/// right after the 4-byte magic.
pub const MAGIC_BINLOG_OFFSET: u64 = 4;
/// `FE 62 69 6E` -- the magic every binlog file (and this storage's
/// objects) must begin with.
pub const MAGIC_BINLOG_PAYLOAD: [u8; 4] = [0xFE, 0x62, 0x69, 0x6E];

/// Binlog file lifecycle, index maintenance, resume-point discovery, and
/// checkpoint policy, backed by any [`StorageBackend`].
///
/// Owned exclusively by the driver loop (never accessed from multiple
/// threads); holds at most one open backend stream at a time.
pub struct Storage {
    backend: StorageBackend,
    replication_mode: ReplicationMode,
    binlog_names: Vec<String>,
    position: u64,
    gtid_set: GtidSet,

    checkpoint_size_bytes: u64,
    last_checkpoint_position: u64,
    checkpoint_interval: Duration,
    last_checkpoint_at: Instant,
}

impl Storage {
    /// Opens (or freshly initializes) storage at `config.uri`, reconciling
    /// any existing binlog index/metadata against the backend's actual
    /// object listing.
    pub fn open(config: &StorageConfig, replication_mode: ReplicationMode) -> IngestResult<Self> {
        let backend = open_backend(&config.uri)?;
        let mut storage = Storage {
            backend,
            replication_mode,
            binlog_names: Vec::new(),
            position: 0,
            gtid_set: GtidSet::new(),
            checkpoint_size_bytes: config.checkpoint_size.bytes(),
            last_checkpoint_position: 0,
            checkpoint_interval: Duration::from_secs(config.checkpoint_interval.seconds()),
            last_checkpoint_at: Instant::now(),
        };

        let objects = storage.backend.list_objects()?;
        if objects.is_empty() {
            info!(description = %storage.backend.description(), "initialized fresh storage");
            return Ok(storage);
        }

        if !objects.contains_key(BINLOG_INDEX_NAME) {
            return Err(IngestError::state_inconsistent("storage is not empty but does not contain a binlog index"));
        }

        let index_content = storage.backend.get_object(BINLOG_INDEX_NAME)?;
        let index_text = String::from_utf8(index_content)
            .map_err(|e| IngestError::state_inconsistent(format!("binlog index is not valid utf-8: {e}")))?;
        storage.binlog_names = index::parse_binlog_index(&index_text)?;
        index::validate_binlog_index(&storage.binlog_names, objects.keys().cloned())?;

        if let Some(tail) = storage.binlog_names.last() {
            storage.position = *objects.get(tail).expect("validated above");
        }

        if replication_mode == ReplicationMode::Gtid {
            if objects.contains_key(METADATA_NAME) {
                let metadata_bytes = storage.backend.get_object(METADATA_NAME)?;
                let metadata = StorageMetadata::from_json_bytes(&metadata_bytes, replication_mode)?;
                storage.gtid_set = metadata.gtid_set;
            }
        }

        debug!(
            binlogs = storage.binlog_names.len(),
            position = storage.position,
            "resumed storage from existing objects"
        );
        Ok(storage)
    }

    pub fn description(&self) -> String {
        self.backend.description()
    }

    pub fn replication_mode(&self) -> ReplicationMode {
        self.replication_mode
    }

    pub fn has_current_binlog_name(&self) -> bool {
        !self.binlog_names.is_empty()
    }

    pub fn current_binlog_name(&self) -> Option<&str> {
        self.binlog_names.last().map(String::as_str)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn gtid_set(&self) -> &GtidSet {
        &self.gtid_set
    }

    pub fn is_binlog_open(&self) -> bool {
        self.backend.is_stream_open()
    }

    /// Seeds the persisted GTID set from a `previous_gtids_log` event.
    pub fn seed_gtid_set(&mut self, gtid_set: GtidSet) {
        self.gtid_set.union(&gtid_set);
    }

    /// Records a transaction's GTID as complete once its closing event has
    /// been accepted by the reader context.
    pub fn record_completed_gtid(&mut self, gtid: &Gtid) {
        self.gtid_set.add(gtid.uuid, gtid.tag.clone(), gtid.gno);
    }

    fn size_checkpointing_enabled(&self) -> bool {
        self.checkpoint_size_bytes != 0
    }

    fn interval_checkpointing_enabled(&self) -> bool {
        self.checkpoint_interval != Duration::ZERO
    }

    /// Opens `binlog_name` for writing: `create` mode if this is a brand
    /// new file (`position == 0`), `append` mode if resuming mid-file.
    pub fn open_binlog(&mut self, binlog_name: &str) -> IngestResult<()> {
        if !index::check_binlog_name(binlog_name) {
            return Err(IngestError::state_inconsistent(format!("cannot open a binlog with invalid name: {binlog_name:?}")));
        }

        let mode = if self.position == 0 { StreamMode::Create } else { StreamMode::Append };
        self.backend.open_stream(binlog_name, mode)?;

        if mode == StreamMode::Create {
            self.backend.write_data_to_stream(&MAGIC_BINLOG_PAYLOAD)?;
            self.backend.flush_stream()?;
            self.binlog_names.push(binlog_name.to_string());
            self.save_binlog_index()?;
            self.position = MAGIC_BINLOG_OFFSET;
        }

        if self.size_checkpointing_enabled() {
            self.last_checkpoint_position = self.position;
        }
        self.last_checkpoint_at = Instant::now();
        debug!(binlog_name, mode = ?mode, position = self.position, "opened binlog");
        Ok(())
    }

    /// Streams one event's raw bytes to the currently open binlog, then
    /// runs the size/time checkpoint policy.
    pub fn write_event(&mut self, event_bytes: &[u8]) -> IngestResult<()> {
        self.backend.write_data_to_stream(event_bytes)?;
        self.position += event_bytes.len() as u64;

        let mut checkpointed = false;
        if self.size_checkpointing_enabled() && self.position >= self.last_checkpoint_position + self.checkpoint_size_bytes {
            self.backend.flush_stream()?;
            self.last_checkpoint_position = self.position;
            checkpointed = true;
        }
        if self.interval_checkpointing_enabled() && self.last_checkpoint_at.elapsed() >= self.checkpoint_interval {
            self.backend.flush_stream()?;
            self.last_checkpoint_at = Instant::now();
            checkpointed = true;
        }

        if checkpointed {
            if self.replication_mode == ReplicationMode::Gtid {
                self.save_metadata()?;
            }
            debug!(position = self.position, "checkpoint flushed");
        }
        Ok(())
    }

    pub fn close_binlog(&mut self) -> IngestResult<()> {
        self.backend.close_stream()?;
        self.position = 0;
        if self.size_checkpointing_enabled() {
            self.last_checkpoint_position = 0;
        }
        Ok(())
    }

    fn save_binlog_index(&self) -> IngestResult<()> {
        let content = index::render_binlog_index(&self.binlog_names);
        self.backend.put_object(BINLOG_INDEX_NAME, content.as_bytes())
    }

    fn save_metadata(&self) -> IngestResult<()> {
        let metadata = StorageMetadata { mode: self.replication_mode, gtid_set: self.gtid_set.clone() };
        self.backend.put_object(METADATA_NAME, &metadata.to_json_bytes()?)
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if self.backend.is_stream_open() {
            let _ = self.backend.close_stream();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::units::{SizeUnit, TimeUnit};
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            uri: format!("file://{}", dir.display()),
            checkpoint_size: SizeUnit(0),
            checkpoint_interval: TimeUnit(0),
        }
    }

    #[test]
    fn fresh_storage_has_no_binlogs() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        assert!(!storage.has_current_binlog_name());
        assert_eq!(storage.position(), 0);
    }

    #[test]
    fn open_binlog_writes_magic_and_index() {
        let dir = tempdir().unwrap();
        let mut storage = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        storage.open_binlog("binlog.000001").unwrap();
        assert_eq!(storage.position(), MAGIC_BINLOG_OFFSET);

        storage.write_event(b"abcd").unwrap();
        storage.close_binlog().unwrap();

        let reopened = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        assert_eq!(reopened.current_binlog_name(), Some("binlog.000001"));
        assert_eq!(reopened.position(), MAGIC_BINLOG_OFFSET + 4);
    }

    #[test]
    fn resuming_mid_file_appends_without_rewriting_magic() {
        let dir = tempdir().unwrap();
        {
            let mut storage = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
            storage.open_binlog("binlog.000001").unwrap();
            storage.write_event(b"abcd").unwrap();
            storage.close_binlog().unwrap();
        }

        let mut storage = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        assert_eq!(storage.position(), MAGIC_BINLOG_OFFSET + 4);
        storage.open_binlog("binlog.000001").unwrap();
        storage.write_event(b"ef").unwrap();
        storage.close_binlog().unwrap();

        let reopened = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        assert_eq!(reopened.position(), MAGIC_BINLOG_OFFSET + 6);
    }

    #[test]
    fn size_checkpointing_flushes_and_tracks_last_position() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.checkpoint_size = SizeUnit(4);
        let mut storage = Storage::open(&cfg, ReplicationMode::Position).unwrap();
        storage.open_binlog("binlog.000001").unwrap();
        storage.write_event(b"abcd").unwrap();
        storage.write_event(b"ef").unwrap();
        // no assertion beyond "doesn't error" -- flush timing is internal
    }

    #[test]
    fn gtid_mode_persists_metadata_on_checkpoint() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.checkpoint_size = SizeUnit(1);
        let mut storage = Storage::open(&cfg, ReplicationMode::Gtid).unwrap();
        storage.open_binlog("binlog.000001").unwrap();

        let uuid = binlog::gtid::uuid::Uuid::from_bytes([0x11; 16]);
        let gtid = Gtid::untagged(uuid, 1).unwrap();
        storage.record_completed_gtid(&gtid);
        storage.write_event(b"abcd").unwrap();
        storage.close_binlog().unwrap();

        let reopened = Storage::open(&cfg, ReplicationMode::Gtid).unwrap();
        assert!(reopened.gtid_set().contains(&gtid));
    }

    #[test]
    fn rejects_reserved_binlog_name() {
        let dir = tempdir().unwrap();
        let mut storage = Storage::open(&config(dir.path()), ReplicationMode::Position).unwrap();
        assert!(storage.open_binlog(BINLOG_INDEX_NAME).is_err());
    }
}
