pub mod connection_config;
pub mod logger_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use connection_config::{ConnectionConfig, ReplicationConfig, SslConfig, SslMode, TlsConfig};
pub use logger_config::{LogLevel, LoggerConfig};
pub use storage_config::StorageConfig;

use crate::err::{IngestError, IngestResult};

/// Root configuration record, deserialized verbatim from a JSON config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub logger: LoggerConfig,

    pub connection: ConnectionConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,

    pub storage: StorageConfig,
}

impl IngestConfig {
    pub fn from_json_str(s: &str) -> IngestResult<Self> {
        let config: IngestConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> IngestResult<()> {
        self.connection.validate()?;
        if self.storage.uri.is_empty() {
            return Err(IngestError::configuration("storage.uri is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let json = r#"{
            "connection": {"host": "db1", "port": 3306, "user": "repl"},
            "storage": {"uri": "file:///var/lib/binlogs"}
        }"#;

        let config = IngestConfig::from_json_str(json).unwrap();
        assert_eq!(config.connection.host.as_deref(), Some("db1"));
        assert_eq!(config.storage.uri, "file:///var/lib/binlogs");
        assert_eq!(config.replication.server_id, 65535);
    }

    #[test]
    fn rejects_missing_storage_uri() {
        let json = r#"{
            "connection": {"host": "db1", "port": 3306, "user": "repl"},
            "storage": {"uri": ""}
        }"#;

        assert!(IngestConfig::from_json_str(json).is_err());
    }

    #[test]
    fn rejects_conflicting_connection_targets() {
        let json = r#"{
            "connection": {"host": "db1", "port": 3306, "dns_srv_name": "_x._tcp", "user": "repl"},
            "storage": {"uri": "file:///tmp"}
        }"#;

        assert!(IngestConfig::from_json_str(json).is_err());
    }
}
