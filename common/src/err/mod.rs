use std::io;

pub mod location;

pub use location::Location;

/// Crate-wide error type.
///
/// Every variant carries the [`Location`] of the call site that raised it,
/// mirroring the raise-site file/line captured by the exception types this
/// crate's ingestion core is modeled on. `Display` always includes it so an
/// operator can go straight from a log line to the offending code.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Event bytes are shorter than declared, a type code is unknown/reserved,
    /// or a post-header/body length doesn't match expectations.
    #[error("[{at}] malformed frame: {reason}")]
    MalformedFrame { reason: String, at: Location },

    /// An event appeared in a position the reader state machine does not allow,
    /// or a mandatory invariant (position tracking, checksum, required flag) failed.
    #[error("[{at}] protocol violation: {reason}")]
    ProtocolViolation { reason: String, at: Location },

    /// Filesystem or object-store operation failed.
    #[error("[{at}] backend I/O error: {source}")]
    BackendIo {
        #[source]
        source: io::Error,
        at: Location,
    },

    /// Storage index/metadata on resume doesn't match the objects actually present.
    #[error("[{at}] storage state inconsistent: {reason}")]
    StateInconsistent { reason: String, at: Location },

    /// Configuration is missing a required key, a value doesn't parse, or
    /// mutually exclusive keys were both set.
    #[error("[{at}] configuration error: {reason}")]
    Configuration { reason: String, at: Location },

    /// JSON (de)serialization of configuration or metadata failed.
    #[error("[{at}] json error: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
        at: Location,
    },
}

impl IngestError {
    #[track_caller]
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        IngestError::MalformedFrame { reason: reason.into(), at: Location::here() }
    }

    #[track_caller]
    pub fn protocol_violation(reason: impl Into<String>) -> Self {
        IngestError::ProtocolViolation { reason: reason.into(), at: Location::here() }
    }

    #[track_caller]
    pub fn state_inconsistent(reason: impl Into<String>) -> Self {
        IngestError::StateInconsistent { reason: reason.into(), at: Location::here() }
    }

    #[track_caller]
    pub fn configuration(reason: impl Into<String>) -> Self {
        IngestError::Configuration { reason: reason.into(), at: Location::here() }
    }
}

impl From<io::Error> for IngestError {
    #[track_caller]
    fn from(source: io::Error) -> Self {
        IngestError::BackendIo { source, at: Location::here() }
    }
}

impl From<serde_json::Error> for IngestError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        IngestError::Json { source, at: Location::here() }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

// kept for readability in call sites that want to match on kind without the payload
impl IngestError {
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, IngestError::ProtocolViolation { .. })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = IngestError::malformed_frame("event too short");
        let rendered = err.to_string();
        assert!(rendered.contains("event too short"));
        assert!(rendered.contains("mod.rs"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: IngestError = io_err.into();
        assert!(matches!(err, IngestError::BackendIo { .. }));
    }
}
