use std::fs::File;
use std::io::Read;
use std::path::Path;

use binlog::header::COMMON_HEADER_LEN;
use common::err::{IngestError, IngestResult};

/// A pull-style producer of raw binlog event byte-spans.
///
/// This is the seam the driver loop pulls through instead of owning a
/// MySQL connection directly: the `COM_BINLOG_DUMP`/`COM_BINLOG_DUMP_GTID`
/// handshake, packet framing, auth, and TLS are a separate, external
/// collaborator -- only this contract matters to the ingestion core. A
/// live implementation strips the leading `0x00` packet-kind byte MySQL
/// sends ahead of each event and returns the remaining bytes verbatim.
pub trait EventSource {
    /// Returns the next event's raw bytes, or `None` once the transport has
    /// cleanly reached end of stream. The core never suspends here beyond
    /// whatever this call itself blocks on.
    fn next_event(&mut self) -> IngestResult<Option<Vec<u8>>>;
}

/// Replays a pre-recorded sequence of event byte-spans. Used by tests and
/// by offline re-ingestion of an already-captured stream.
pub struct ReplayEventSource {
    events: std::vec::IntoIter<Vec<u8>>,
}

impl ReplayEventSource {
    pub fn new(events: Vec<Vec<u8>>) -> Self {
        ReplayEventSource { events: events.into_iter() }
    }
}

impl EventSource for ReplayEventSource {
    fn next_event(&mut self) -> IngestResult<Option<Vec<u8>>> {
        Ok(self.events.next())
    }
}

/// Reads a concatenated stream of raw binlog events from a file, relying
/// on each event's own `event_size` field (the common header is
/// self-describing) to find its boundary -- no external length prefix
/// needed. Used to re-ingest an already-captured event stream (e.g. one
/// produced by `mysqlbinlog` or a prior run of this program) without a
/// live MySQL connection.
pub struct FileEventSource {
    file: File,
}

impl FileEventSource {
    pub fn open(path: impl AsRef<Path>) -> IngestResult<Self> {
        Ok(FileEventSource { file: File::open(path)? })
    }
}

impl EventSource for FileEventSource {
    fn next_event(&mut self) -> IngestResult<Option<Vec<u8>>> {
        let mut header = [0u8; COMMON_HEADER_LEN];
        match read_exact_or_eof(&mut self.file, &mut header)? {
            false => return Ok(None),
            true => {}
        }

        let event_size = u32::from_le_bytes([header[9], header[10], header[11], header[12]]) as usize;
        if event_size < COMMON_HEADER_LEN {
            return Err(IngestError::malformed_frame("event_size smaller than the common header"));
        }

        let mut event = Vec::with_capacity(event_size);
        event.extend_from_slice(&header);
        event.resize(event_size, 0);
        self.file.read_exact(&mut event[COMMON_HEADER_LEN..])?;
        Ok(Some(event))
    }
}

/// Like `Read::read_exact`, but reports a clean end of stream (no bytes
/// read at all) as `Ok(false)` instead of an error, and still errors on a
/// stream that ends partway through the buffer.
fn read_exact_or_eof(file: &mut File, buf: &mut [u8]) -> IngestResult<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(IngestError::malformed_frame("stream ended partway through an event header"));
        }
        filled += n;
    }
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn sample_event(event_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut event = Vec::new();
        event.extend_from_slice(&0u32.to_le_bytes());
        event.push(event_type);
        event.extend_from_slice(&1u32.to_le_bytes());
        event.extend_from_slice(&0u32.to_le_bytes()); // event_size placeholder
        event.extend_from_slice(&0u32.to_le_bytes());
        event.extend_from_slice(&0u16.to_le_bytes());
        event.extend_from_slice(payload);
        let size = (event.len() as u32).to_le_bytes();
        event[9..13].copy_from_slice(&size);
        event
    }

    #[test]
    fn replays_events_in_order() {
        let events = vec![sample_event(4, b"a"), sample_event(2, b"bb")];
        let mut source = ReplayEventSource::new(events.clone());
        assert_eq!(source.next_event().unwrap(), Some(events[0].clone()));
        assert_eq!(source.next_event().unwrap(), Some(events[1].clone()));
        assert_eq!(source.next_event().unwrap(), None);
    }

    #[test]
    fn file_source_splits_concatenated_events_by_their_own_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.bin");
        let a = sample_event(4, b"hello");
        let b = sample_event(2, b"world!");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&a).unwrap();
            f.write_all(&b).unwrap();
        }

        let mut source = FileEventSource::open(&path).unwrap();
        assert_eq!(source.next_event().unwrap(), Some(a));
        assert_eq!(source.next_event().unwrap(), Some(b));
        assert_eq!(source.next_event().unwrap(), None);
    }

    #[test]
    fn file_source_rejects_a_stream_cut_off_mid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [0u8; 5]).unwrap();

        let mut source = FileEventSource::open(&path).unwrap();
        assert!(source.next_event().is_err());
    }
}
