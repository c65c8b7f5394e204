use serde::{Deserialize, Serialize};

use crate::units::{SizeUnit, TimeUnit};

/// Storage backend selection and checkpoint policy.
///
/// `checkpoint_size` and `checkpoint_interval` default to `0`, which disables
/// that particular checkpoint trigger (the other may still fire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `file://<path>` or `s3://[user:pass@]bucket/prefix`.
    pub uri: String,

    #[serde(default)]
    pub checkpoint_size: SizeUnit,

    #[serde(default)]
    pub checkpoint_interval: TimeUnit,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            uri: String::new(),
            checkpoint_size: SizeUnit::default(),
            checkpoint_interval: TimeUnit::default(),
        }
    }
}
