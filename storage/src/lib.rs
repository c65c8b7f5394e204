pub mod backend;
pub mod engine;
pub mod index;
pub mod metadata;

pub use backend::{open_backend, BackendOps, StorageBackend, StreamMode};
pub use engine::{Storage, MAGIC_BINLOG_OFFSET, MAGIC_BINLOG_PAYLOAD};
pub use metadata::{ReplicationMode, StorageMetadata};
