//! JSON and blob helpers for SQLite columns
//!
//! Conflict candidates, resolutions and history windows are stored as JSON
//! text. Hashes and public keys are stored as raw blobs.

use hashward_core::{
    Candidate, DataHash, HistoryEntry, PublicKey, Resolution, HASH_LEN, PUBLIC_KEY_LEN,
};

use crate::error::{Result, SqliteError};

/// Serialize conflict candidates for the `candidates` column
pub fn serialize_candidates(candidates: &[Candidate]) -> Result<String> {
    Ok(serde_json::to_string(candidates)?)
}

pub fn deserialize_candidates(json: &str) -> Result<Vec<Candidate>> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize an optional resolution; `None` stays SQL NULL
pub fn serialize_resolution(resolution: Option<&Resolution>) -> Result<Option<String>> {
    resolution
        .map(serde_json::to_string)
        .transpose()
        .map_err(SqliteError::from)
}

pub fn deserialize_resolution(json: Option<String>) -> Result<Option<Resolution>> {
    match json {
        Some(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
        None => Ok(None),
    }
}

/// Serialize a history window for the `entries` column
pub fn serialize_history(entries: &[HistoryEntry]) -> Result<String> {
    Ok(serde_json::to_string(entries)?)
}

pub fn deserialize_history(json: &str) -> Result<Vec<HistoryEntry>> {
    Ok(serde_json::from_str(json)?)
}

pub fn hash_from_blob(blob: &[u8]) -> Result<DataHash> {
    DataHash::from_slice(blob).ok_or(SqliteError::Corrupt {
        column: "hash",
        expected: HASH_LEN,
        found: blob.len(),
    })
}

pub fn public_key_from_blob(blob: &[u8]) -> Result<PublicKey> {
    PublicKey::from_slice(blob).ok_or(SqliteError::Corrupt {
        column: "public_key",
        expected: PUBLIC_KEY_LEN,
        found: blob.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_candidates() {
        let candidates = vec![Candidate {
            hash: DataHash::new([0xaa; 32]),
            device_id: "laptop".to_string(),
            timestamp: 1704067200000,
        }];
        let json = serialize_candidates(&candidates).unwrap();
        assert!(json.contains(&"aa".repeat(32)));
        assert!(json.contains("laptop"));
        assert_eq!(deserialize_candidates(&json).unwrap(), candidates);
    }

    #[test]
    fn test_none_resolution_is_null() {
        assert_eq!(serialize_resolution(None).unwrap(), None);
        assert_eq!(deserialize_resolution(None).unwrap(), None);
    }

    #[test]
    fn test_history_operation_tag() {
        let entries = vec![HistoryEntry::submit(DataHash::new([1; 32]), "phone", 5)];
        let json = serialize_history(&entries).unwrap();
        assert!(json.contains(r#""operation":"submit""#));
    }

    #[test]
    fn test_corrupt_blob() {
        let err = hash_from_blob(&[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            SqliteError::Corrupt { column: "hash", expected: 32, found: 31 }
        ));
        assert!(public_key_from_blob(&[0u8; 33]).is_ok());
    }
}
