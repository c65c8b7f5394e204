use std::fmt;
use std::panic::Location as StdLocation;

/// Captures the file/line of an error's raise site.
///
/// Always built via [`Location::here`], called from a `#[track_caller]`
/// constructor so the location recorded is the caller's, not this file's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    #[track_caller]
    pub fn here() -> Self {
        let loc = StdLocation::caller();
        Location { file: loc.file(), line: loc.line() }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
