use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use common::err::{IngestError, IngestResult};

use super::{BackendOps, ObjectListing, StreamMode};

/// Objects larger than this are refused by [`FilesystemBackend::get_object`]
/// -- a whole-object read is expected to stay in memory, matching the
/// reference implementation's in-memory object cap.
pub const MAX_MEMORY_OBJECT_SIZE: u64 = 1024 * 1024;

/// `file://<path>` backend: each object is a file directly under `root`.
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
    stream: Option<File>,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> IngestResult<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(IngestError::configuration(format!("storage root {root:?} does not exist")));
        }
        if !root.is_dir() {
            return Err(IngestError::configuration(format!("storage root {root:?} is not a directory")));
        }
        Ok(FilesystemBackend { root, stream: None })
    }

    pub fn from_url(url: &url::Url) -> IngestResult<Self> {
        if url.scheme() != "file" {
            return Err(IngestError::configuration("filesystem backend requires a file:// URI"));
        }
        if url.has_host() && !url.host_str().unwrap_or_default().is_empty() {
            return Err(IngestError::configuration("file URI must not have a host"));
        }
        Self::new(PathBuf::from(url.path()))
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BackendOps for FilesystemBackend {
    fn list_objects(&self) -> IngestResult<ObjectListing> {
        let mut result = ObjectListing::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                return Err(IngestError::state_inconsistent(format!(
                    "storage root contains a non-regular-file entry: {:?}",
                    entry.path()
                )));
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            result.insert(name, metadata.len());
        }
        Ok(result)
    }

    fn get_object(&self, name: &str) -> IngestResult<Vec<u8>> {
        let path = self.object_path(name);
        let size = fs::metadata(&path)?.len();
        if size > MAX_MEMORY_OBJECT_SIZE {
            return Err(IngestError::state_inconsistent(format!(
                "object {name:?} is too large to load in memory ({size} bytes)"
            )));
        }
        let mut file = File::open(&path)?;
        let mut content = Vec::with_capacity(size as usize);
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    fn put_object(&self, name: &str, content: &[u8]) -> IngestResult<()> {
        let path = self.object_path(name);
        let mut file = File::create(&path)?;
        file.write_all(content)?;
        Ok(())
    }

    fn open_stream(&mut self, name: &str, mode: StreamMode) -> IngestResult<()> {
        let path = self.object_path(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(mode == StreamMode::Create)
            .append(mode == StreamMode::Append)
            .open(&path)?;
        self.stream = Some(file);
        Ok(())
    }

    fn write_data_to_stream(&mut self, data: &[u8]) -> IngestResult<()> {
        let file = self.stream.as_mut().expect("stream invariant enforced by StorageBackend");
        file.write_all(data)?;
        Ok(())
    }

    fn flush_stream(&mut self) -> IngestResult<()> {
        let file = self.stream.as_mut().expect("stream invariant enforced by StorageBackend");
        file.flush()?;
        Ok(())
    }

    fn close_stream(&mut self) -> IngestResult<()> {
        self.stream = None;
        Ok(())
    }

    fn description(&self) -> String {
        format!("local filesystem - {}", self.root.display())
    }
}
