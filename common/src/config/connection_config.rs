use serde::{Deserialize, Serialize};

use crate::err::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslMode {
    Disabled,
    Preferred,
    Required,
    VerifyCa,
    VerifyIdentity,
}

impl Default for SslMode {
    fn default() -> Self {
        SslMode::Disabled
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslConfig {
    pub mode: SslMode,
    #[serde(default)]
    pub ca: Option<String>,
    #[serde(default)]
    pub capath: Option<String>,
    #[serde(default)]
    pub crl: Option<String>,
    #[serde(default)]
    pub crlpath: Option<String>,
    #[serde(default)]
    pub cert: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub cipher: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    #[serde(default)]
    pub ciphersuites: Option<String>,
}

fn default_server_id() -> u32 {
    65535
}

fn default_timeout_secs() -> u32 {
    30
}

/// Settings used to connect to the MySQL/MariaDB source as a replication client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub dns_srv_name: Option<String>,

    pub user: String,
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_timeout_secs")]
    pub connect_timeout: u32,
    #[serde(default = "default_timeout_secs")]
    pub read_timeout: u32,
    #[serde(default = "default_timeout_secs")]
    pub write_timeout: u32,

    #[serde(default)]
    pub ssl: SslConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: Some("localhost".to_string()),
            port: Some(3306),
            dns_srv_name: None,
            user: String::new(),
            password: String::new(),
            connect_timeout: default_timeout_secs(),
            read_timeout: default_timeout_secs(),
            write_timeout: default_timeout_secs(),
            ssl: SslConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Exactly one of `{host+port, dns_srv_name}` must be specified.
    pub fn validate(&self) -> Result<(), IngestError> {
        let has_host_port = self.host.is_some() && self.port.is_some();
        let has_srv = self.dns_srv_name.is_some();

        match (has_host_port, has_srv) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(IngestError::configuration(
                "connection.host/port and connection.dns_srv_name are mutually exclusive",
            )),
            (false, false) => Err(IngestError::configuration(
                "connection requires either host+port or dns_srv_name",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "default_server_id")]
    pub server_id: u32,
    #[serde(default = "default_timeout_secs")]
    pub idle_time: u32,
    /// Whether to issue `COM_BINLOG_DUMP_GTID` and run the reader context
    /// and storage engine in GTID mode. Source-capability negotiation
    /// itself lives in the (out-of-scope) transport; this just picks which
    /// side of that negotiation the core runs as.
    #[serde(default)]
    pub gtid_mode: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        ReplicationConfig { server_id: default_server_id(), idle_time: default_timeout_secs(), gtid_mode: false }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_both_host_and_srv() {
        let cfg = ConnectionConfig {
            dns_srv_name: Some("_mysql._tcp.example.com".to_string()),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_neither_host_nor_srv() {
        let cfg = ConnectionConfig { host: None, port: None, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_host_and_port() {
        assert!(ConnectionConfig::default().validate().is_ok());
    }
}
