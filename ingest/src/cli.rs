use std::path::PathBuf;

use clap::Parser;
use common::config::{ConnectionConfig, IngestConfig, LogLevel, LoggerConfig, ReplicationConfig, StorageConfig};
use common::err::{IngestError, IngestResult};
use common::units::{SizeUnit, TimeUnit};

/// Ingests a MySQL binlog stream to durable storage.
///
/// Accepts either a single JSON config file, or the common configuration
/// keys spelled out as flags for a quick manual run.
#[derive(Parser, Debug)]
#[command(name = "binsrv")]
#[command(version)]
#[command(about = "MySQL binlog ingestion server")]
pub struct CliArgs {
    /// Path to a JSON config file. When given, every other flag is ignored.
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,
    #[arg(long, value_name = "PASSWORD", default_value = "")]
    pub password: String,

    #[arg(long = "storage-uri", value_name = "URI")]
    pub storage_uri: Option<String>,
    #[arg(long = "server-id", value_name = "ID")]
    pub server_id: Option<u32>,
    #[arg(long = "gtid-mode", default_value_t = false)]
    pub gtid_mode: bool,

    #[arg(long = "checkpoint-size", value_name = "SIZE")]
    pub checkpoint_size: Option<String>,
    #[arg(long = "checkpoint-interval", value_name = "TIME")]
    pub checkpoint_interval: Option<String>,

    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Re-ingests a previously captured raw event stream instead of
    /// connecting to a live source. Not part of the configuration schema --
    /// a CLI-only convenience for offline runs and local verification.
    #[arg(long = "replay-file", value_name = "PATH")]
    pub replay_file: Option<PathBuf>,
}

impl CliArgs {
    /// Resolves this invocation into a validated [`IngestConfig`], either by
    /// reading the positional config file or by assembling one from flags.
    pub fn resolve(&self) -> IngestResult<IngestConfig> {
        if let Some(path) = &self.config {
            return IngestConfig::from_json_file(path);
        }

        let user = self
            .user
            .clone()
            .ok_or_else(|| IngestError::configuration("--user is required when no config file is given"))?;
        let storage_uri = self
            .storage_uri
            .clone()
            .ok_or_else(|| IngestError::configuration("--storage-uri is required when no config file is given"))?;

        let mut logger = LoggerConfig::default();
        if let Some(level) = &self.log_level {
            logger.level = parse_log_level(level)?;
        }

        let connection = ConnectionConfig {
            host: self.host.clone().or_else(|| Some("localhost".to_string())),
            port: self.port.or(Some(3306)),
            dns_srv_name: None,
            user,
            password: self.password.clone(),
            ..ConnectionConfig::default()
        };

        let mut replication = ReplicationConfig::default();
        if let Some(server_id) = self.server_id {
            replication.server_id = server_id;
        }
        replication.gtid_mode = self.gtid_mode;

        let storage = StorageConfig {
            uri: storage_uri,
            checkpoint_size: match &self.checkpoint_size {
                Some(s) => s.parse().map_err(|_| IngestError::configuration(format!("bad --checkpoint-size: {s}")))?,
                None => SizeUnit(0),
            },
            checkpoint_interval: match &self.checkpoint_interval {
                Some(s) => {
                    s.parse().map_err(|_| IngestError::configuration(format!("bad --checkpoint-interval: {s}")))?
                }
                None => TimeUnit(0),
            },
        };

        let config = IngestConfig { logger, connection, replication, storage };
        config.validate()?;
        Ok(config)
    }
}

fn parse_log_level(s: &str) -> IngestResult<LogLevel> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warning" | "warn" => Ok(LogLevel::Warning),
        "error" => Ok(LogLevel::Error),
        "fatal" => Ok(LogLevel::Fatal),
        other => Err(IngestError::configuration(format!("unrecognized log level: {other}"))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_run_requires_user_and_storage_uri() {
        let args = CliArgs {
            config: None,
            host: None,
            port: None,
            user: None,
            password: String::new(),
            storage_uri: Some("file:///tmp/x".to_string()),
            server_id: None,
            gtid_mode: false,
            checkpoint_size: None,
            checkpoint_interval: None,
            log_level: None,
            replay_file: None,
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn flag_run_builds_a_valid_config() {
        let args = CliArgs {
            config: None,
            host: Some("db1".to_string()),
            port: Some(3306),
            user: Some("repl".to_string()),
            password: "secret".to_string(),
            storage_uri: Some("file:///tmp/x".to_string()),
            server_id: Some(42),
            gtid_mode: true,
            checkpoint_size: Some("4M".to_string()),
            checkpoint_interval: Some("30s".to_string()),
            log_level: Some("debug".to_string()),
            replay_file: None,
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.connection.host.as_deref(), Some("db1"));
        assert_eq!(config.replication.server_id, 42);
        assert!(config.replication.gtid_mode);
        assert_eq!(config.storage.checkpoint_size.bytes(), 4 << 20);
    }
}
