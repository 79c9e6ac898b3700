//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Storage backend error (database, filesystem, etc.)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transaction misuse (nested begin, commit without begin)
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
