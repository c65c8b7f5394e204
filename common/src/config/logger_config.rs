use serde::{Deserialize, Serialize};

/// Minimum severity emitted by the process-wide tracing subscriber, ordered
/// the way the reference implementation orders its logger levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            // tracing has no FATAL level; a fatal condition is still an error event.
            LogLevel::Error | LogLevel::Fatal => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// If non-empty, logs are additionally written to this file (daily-rolling).
    #[serde(default)]
    pub file: Option<String>,
}
