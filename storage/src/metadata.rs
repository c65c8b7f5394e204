use serde::{Deserialize, Serialize};

use binlog::gtid::gtid_set::GtidSet;
use common::err::{IngestError, IngestResult};

/// Current `metadata.json` schema version. Bumped whenever the persisted
/// shape changes in a way old readers cannot tolerate.
pub const STORAGE_METADATA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    Position,
    Gtid,
}

/// On-disk shape of `metadata.json`: schema version, replication mode, and
/// the GTID set hex-encoded as its canonical binary form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataRecord {
    version: u32,
    mode: ReplicationMode,
    gtid_set: String,
}

#[derive(Debug, Clone)]
pub struct StorageMetadata {
    pub mode: ReplicationMode,
    pub gtid_set: GtidSet,
}

impl StorageMetadata {
    pub fn new(mode: ReplicationMode) -> Self {
        StorageMetadata { mode, gtid_set: GtidSet::new() }
    }

    pub fn to_json_bytes(&self) -> IngestResult<Vec<u8>> {
        let mut encoded = Vec::new();
        self.gtid_set.encode_to(&mut encoded);
        let record = MetadataRecord { version: STORAGE_METADATA_VERSION, mode: self.mode, gtid_set: hex::encode(encoded) };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    pub fn from_json_bytes(bytes: &[u8], expected_mode: ReplicationMode) -> IngestResult<Self> {
        let record: MetadataRecord = serde_json::from_slice(bytes)?;
        if record.version != STORAGE_METADATA_VERSION {
            return Err(IngestError::state_inconsistent(format!(
                "unsupported storage metadata version {}, expected {STORAGE_METADATA_VERSION}",
                record.version
            )));
        }
        if record.mode != expected_mode {
            return Err(IngestError::state_inconsistent(format!(
                "storage metadata declares replication mode {:?}, running in {:?}",
                record.mode, expected_mode
            )));
        }
        let raw = hex::decode(&record.gtid_set)
            .map_err(|e| IngestError::state_inconsistent(format!("storage metadata gtid_set is not valid hex: {e}")))?;
        let gtid_set = GtidSet::decode_from(&raw)?;
        Ok(StorageMetadata { mode: record.mode, gtid_set })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use binlog::gtid::tag::Tag;
    use binlog::gtid::uuid::Uuid;

    #[test]
    fn roundtrips_through_json() {
        let mut metadata = StorageMetadata::new(ReplicationMode::Gtid);
        metadata.gtid_set.add(Uuid::from_bytes([0x11; 16]), Tag::empty(), 7);

        let bytes = metadata.to_json_bytes().unwrap();
        let decoded = StorageMetadata::from_json_bytes(&bytes, ReplicationMode::Gtid).unwrap();
        assert_eq!(decoded.gtid_set, metadata.gtid_set);
    }

    #[test]
    fn rejects_mode_mismatch() {
        let metadata = StorageMetadata::new(ReplicationMode::Gtid);
        let bytes = metadata.to_json_bytes().unwrap();
        assert!(StorageMetadata::from_json_bytes(&bytes, ReplicationMode::Position).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let json = r#"{"version": 99, "mode": "gtid", "gtid_set": ""}"#;
        assert!(StorageMetadata::from_json_bytes(json.as_bytes(), ReplicationMode::Gtid).is_err());
    }
}
