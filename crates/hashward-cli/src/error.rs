//! Error type for the hashward binary

use hashward_core::IntegrityError;
use hashward_sqlite::SqliteError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Storage(#[from] SqliteError),

    /// Command-line argument that cannot be turned into a hash or key
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
