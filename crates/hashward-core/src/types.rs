//! Record types stored in the four owner-namespaced tables

use serde::{Deserialize, Serialize};

use crate::hash::{DataHash, PublicKey};

/// A client identity registered under an owner.
///
/// Devices are never removed: deactivation flips `is_active` and keeps the
/// record so earlier submissions stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub display_name: String,
    pub public_key: PublicKey,
    pub is_active: bool,
}

/// The currently accepted hash for one data item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    pub hash: DataHash,
    /// Unix timestamp milliseconds
    pub timestamp: i64,
    /// Device that submitted this hash originally
    pub device_id: String,
}

/// One hash proposed while a conflict is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub hash: DataHash,
    pub device_id: String,
    pub timestamp: i64,
}

impl From<&HashRecord> for Candidate {
    fn from(record: &HashRecord) -> Self {
        Self {
            hash: record.hash,
            device_id: record.device_id.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// How a conflict was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub hash: DataHash,
    /// Principal that resolved the conflict
    pub resolver: String,
    pub timestamp: i64,
}

/// Divergent hashes for one data item.
///
/// A record with `is_resolved == false` is an open conflict. Resolved
/// records stay in the table for audit until a later divergence replaces
/// them with a fresh round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Starts at 1 and increments each time a conflict reopens on the key
    pub round: u32,
    pub candidates: Vec<Candidate>,
    pub is_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl ConflictRecord {
    pub fn is_open(&self) -> bool {
        !self.is_resolved
    }

    pub fn candidate(&self, hash: &DataHash) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.hash == hash)
    }

    pub fn contains(&self, hash: &DataHash) -> bool {
        self.candidate(hash).is_some()
    }
}

/// Kind of event recorded in the integrity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Submit,
    Resolve,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Submit => "submit",
            Operation::Resolve => "resolve",
        }
    }
}

/// One audit entry for a data item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub hash: DataHash,
    pub timestamp: i64,
    pub device_id: String,
    pub operation: Operation,
}

impl HistoryEntry {
    pub fn submit(hash: DataHash, device_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            hash,
            timestamp,
            device_id: device_id.into(),
            operation: Operation::Submit,
        }
    }

    pub fn resolve(hash: DataHash, device_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            hash,
            timestamp,
            device_id: device_id.into(),
            operation: Operation::Resolve,
        }
    }
}

/// What a successful `submit_hash` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// First hash for the data item became the accepted hash
    Baseline,
    /// Hash matched the accepted hash; nothing changed
    Confirmed,
    /// Divergence opened a new conflict
    ConflictOpened { round: u32 },
    /// Divergence added a candidate to the open conflict
    CandidateAdded { candidates: usize },
    /// Hash was already a candidate of the open conflict
    CandidateKnown,
}
