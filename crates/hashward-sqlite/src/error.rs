//! Error types for SQLite storage backend

use hashward_core::storage::StoreError;
use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors that can occur during SQLite storage operations
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database connection or query error
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored bytes that cannot be a hash or public key
    #[error("Corrupt column {column}: expected {expected} bytes, found {found}")]
    Corrupt {
        column: &'static str,
        expected: usize,
        found: usize,
    },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Transaction misuse
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert SqliteError to StoreError for the storage trait
impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Json(e) => StoreError::Serialization(e.to_string()),
            SqliteError::Corrupt { .. } => StoreError::Serialization(err.to_string()),
            SqliteError::Database(e) => StoreError::Backend(format!("SQLite: {}", e)),
            SqliteError::Migration(msg) => StoreError::Backend(format!("Migration: {}", msg)),
            SqliteError::Transaction(msg) => StoreError::Transaction(msg),
            SqliteError::Io(e) => StoreError::Backend(format!("IO: {}", e)),
        }
    }
}
