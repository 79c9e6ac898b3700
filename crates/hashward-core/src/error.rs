//! Engine error types

use thiserror::Error;

use crate::hash::DataHash;
use crate::storage::StoreError;

/// Errors returned by the integrity engine and its components.
///
/// Every variant is recoverable by the caller. A call that fails leaves the
/// device, hash, conflict and history tables exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// Caller lacks the permission the operation requires
    #[error("'{0}' is not authorized for this operation")]
    NotAuthorized(String),

    /// Device is unknown or has been deactivated
    #[error("device '{0}' is unknown or inactive")]
    InvalidDevice(String),

    /// No accepted hash exists for the data item
    #[error("no hash recorded for data '{0}'")]
    DataNotFound(String),

    /// Verification compared unequal against the accepted hash
    #[error("hash mismatch for data '{data_id}': stored {stored}, presented {presented}")]
    HashMismatch {
        data_id: String,
        stored: DataHash,
        presented: DataHash,
    },

    /// Resolution requested while no conflict is open
    #[error("no open conflict for data '{0}'")]
    NoConflict(String),

    /// Selected hash was never submitted as a candidate
    #[error("hash {hash} is not a candidate for data '{data_id}'")]
    InvalidResolution { data_id: String, hash: DataHash },

    /// Conflict candidate list is full
    #[error("conflict for data '{data_id}' already holds {limit} candidates")]
    CapacityExceeded { data_id: String, limit: usize },

    /// Boundary validation failed (lengths, widths)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Proof verifier rejected the proof bytes
    #[error("proof rejected for data '{0}'")]
    InvalidProof(String),

    /// Storage backend failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for engine operations
pub type IntegrityResult<T> = Result<T, IntegrityError>;
