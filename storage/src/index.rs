use std::collections::HashSet;

use common::err::{IngestError, IngestResult};

/// Reserved object name for the binlog index.
pub const BINLOG_INDEX_NAME: &str = "binlog.index";
/// Reserved object name for GTID-mode checkpoint metadata.
pub const METADATA_NAME: &str = "metadata.json";

/// A binlog name must not contain a filesystem separator and must not
/// collide with either of the two reserved object names. Uniqueness within
/// an index is checked separately by the caller, since it needs the full
/// list to do so.
pub fn check_binlog_name(name: &str) -> bool {
    if name.is_empty() || name == BINLOG_INDEX_NAME || name == METADATA_NAME {
        return false;
    }
    !name.contains('/') && !name.contains('\\')
}

/// Parses `binlog.index` content: one `./<name>` entry per non-empty line,
/// in creation order. Rejects malformed paths, references to reserved
/// names, and duplicates.
pub fn parse_binlog_index(content: &str) -> IngestResult<Vec<String>> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let name = line
            .strip_prefix("./")
            .ok_or_else(|| IngestError::state_inconsistent(format!("binlog index entry {line:?} has an invalid path")))?;

        if !check_binlog_name(name) {
            return Err(IngestError::state_inconsistent(format!(
                "binlog index references a reserved or invalid binlog name: {name:?}"
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(IngestError::state_inconsistent(format!("binlog index contains a duplicate entry: {name:?}")));
        }
        names.push(name.to_string());
    }

    Ok(names)
}

/// Renders `binlog.index` content for the given names, in order, one
/// `./<name>\n` entry per line, with no blank lines.
pub fn render_binlog_index(names: &[String]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str("./");
        out.push_str(name);
        out.push('\n');
    }
    out
}

/// Cross-checks the loaded index against the backend's actual object
/// listing: every object other than the index and metadata files must be
/// referenced by the index, and every indexed name must exist as an object.
pub fn validate_binlog_index(names: &[String], object_names: impl Iterator<Item = String>) -> IngestResult<()> {
    let indexed: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut known_entries = 0usize;

    for object_name in object_names {
        if object_name == BINLOG_INDEX_NAME || object_name == METADATA_NAME {
            continue;
        }
        if !indexed.contains(object_name.as_str()) {
            return Err(IngestError::state_inconsistent(format!(
                "storage contains an object not referenced by the binlog index: {object_name:?}"
            )));
        }
        known_entries += 1;
    }

    if known_entries != names.len() {
        return Err(IngestError::state_inconsistent(
            "binlog index references an object that does not exist in storage",
        ));
    }

    Ok(())
}
