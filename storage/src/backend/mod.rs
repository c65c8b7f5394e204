pub mod filesystem;
pub mod object_store;

use std::collections::BTreeMap;
use std::fmt;

use common::err::{IngestError, IngestResult};

pub use filesystem::FilesystemBackend;
pub use object_store::ObjectStoreBackend;

/// Object name -> size in bytes, as returned by a backend's object listing.
pub type ObjectListing = BTreeMap<String, u64>;

/// Whether a newly opened stream should truncate-and-create or append to an
/// existing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Create,
    Append,
}

/// The operations a concrete backend must provide. Object-safe so backends
/// can be boxed behind [`StorageBackend`], which layers the "exactly one
/// open stream" invariant on top -- individual backends do not need to
/// track that themselves.
pub trait BackendOps: fmt::Debug + Send {
    fn list_objects(&self) -> IngestResult<ObjectListing>;
    fn get_object(&self, name: &str) -> IngestResult<Vec<u8>>;
    fn put_object(&self, name: &str, content: &[u8]) -> IngestResult<()>;

    fn open_stream(&mut self, name: &str, mode: StreamMode) -> IngestResult<()>;
    fn write_data_to_stream(&mut self, data: &[u8]) -> IngestResult<()>;
    fn flush_stream(&mut self) -> IngestResult<()>;
    fn close_stream(&mut self) -> IngestResult<()>;

    fn description(&self) -> String;
}

/// Wraps a [`BackendOps`] implementation and enforces the one-open-stream
/// invariant and open-before-write/close ordering that every backend must
/// honor, so individual backends only implement their actual I/O.
#[derive(Debug)]
pub struct StorageBackend {
    inner: Box<dyn BackendOps>,
    stream_open: bool,
}

impl StorageBackend {
    pub fn new(inner: Box<dyn BackendOps>) -> Self {
        StorageBackend { inner, stream_open: false }
    }

    pub fn list_objects(&self) -> IngestResult<ObjectListing> {
        self.inner.list_objects()
    }

    pub fn get_object(&self, name: &str) -> IngestResult<Vec<u8>> {
        self.inner.get_object(name)
    }

    pub fn put_object(&self, name: &str, content: &[u8]) -> IngestResult<()> {
        self.inner.put_object(name, content)
    }

    pub fn is_stream_open(&self) -> bool {
        self.stream_open
    }

    pub fn open_stream(&mut self, name: &str, mode: StreamMode) -> IngestResult<()> {
        if self.stream_open {
            return Err(IngestError::state_inconsistent(
                "cannot open a new stream as the previous one has not been closed",
            ));
        }
        self.inner.open_stream(name, mode)?;
        self.stream_open = true;
        Ok(())
    }

    pub fn write_data_to_stream(&mut self, data: &[u8]) -> IngestResult<()> {
        if !self.stream_open {
            return Err(IngestError::state_inconsistent("cannot write to the stream as it has not been opened"));
        }
        self.inner.write_data_to_stream(data)
    }

    pub fn flush_stream(&mut self) -> IngestResult<()> {
        if !self.stream_open {
            return Err(IngestError::state_inconsistent("cannot flush the stream as it has not been opened"));
        }
        self.inner.flush_stream()
    }

    pub fn close_stream(&mut self) -> IngestResult<()> {
        if !self.stream_open {
            return Err(IngestError::state_inconsistent("cannot close the stream as it has not been opened"));
        }
        self.inner.close_stream()?;
        self.stream_open = false;
        Ok(())
    }

    pub fn description(&self) -> String {
        self.inner.description()
    }
}

impl Drop for StorageBackend {
    fn drop(&mut self) {
        if self.stream_open {
            let _ = self.inner.close_stream();
        }
    }
}

/// Dispatches a `storage.uri` to the matching backend constructor by URI
/// scheme: `file://` or `s3://`. Any other scheme is a configuration error.
pub fn open_backend(uri: &str) -> IngestResult<StorageBackend> {
    let parsed = url::Url::parse(uri).map_err(|e| IngestError::configuration(format!("invalid storage URI {uri:?}: {e}")))?;
    match parsed.scheme() {
        "file" => Ok(StorageBackend::new(Box::new(FilesystemBackend::from_url(&parsed)?))),
        "s3" => Ok(StorageBackend::new(Box::new(ObjectStoreBackend::from_url(&parsed)?))),
        other => Err(IngestError::configuration(format!("unknown storage backend scheme {other:?}"))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeBackend {
        open: bool,
    }

    impl BackendOps for FakeBackend {
        fn list_objects(&self) -> IngestResult<ObjectListing> {
            Ok(ObjectListing::new())
        }
        fn get_object(&self, _name: &str) -> IngestResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn put_object(&self, _name: &str, _content: &[u8]) -> IngestResult<()> {
            Ok(())
        }
        fn open_stream(&mut self, _name: &str, _mode: StreamMode) -> IngestResult<()> {
            self.open = true;
            Ok(())
        }
        fn write_data_to_stream(&mut self, _data: &[u8]) -> IngestResult<()> {
            Ok(())
        }
        fn flush_stream(&mut self) -> IngestResult<()> {
            Ok(())
        }
        fn close_stream(&mut self) -> IngestResult<()> {
            self.open = false;
            Ok(())
        }
        fn description(&self) -> String {
            "fake".to_string()
        }
    }

    #[test]
    fn rejects_double_open() {
        let mut backend = StorageBackend::new(Box::new(FakeBackend::default()));
        backend.open_stream("a", StreamMode::Create).unwrap();
        assert!(backend.open_stream("b", StreamMode::Create).is_err());
    }

    #[test]
    fn rejects_write_before_open() {
        let mut backend = StorageBackend::new(Box::new(FakeBackend::default()));
        assert!(backend.write_data_to_stream(b"x").is_err());
    }

    #[test]
    fn allows_open_write_close_cycle() {
        let mut backend = StorageBackend::new(Box::new(FakeBackend::default()));
        backend.open_stream("a", StreamMode::Create).unwrap();
        backend.write_data_to_stream(b"x").unwrap();
        backend.close_stream().unwrap();
        assert!(!backend.is_stream_open());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(open_backend("ftp://example.com/root").is_err());
    }
}
