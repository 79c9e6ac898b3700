//! SQLite storage backend for Hashward
//!
//! This crate provides a persistent SQLite implementation of the
//! hashward-core `IntegrityStore` trait, so the integrity engine can keep
//! devices, accepted hashes, conflicts and history on disk.
//!
//! # Features
//!
//! - Implements the `IntegrityStore` trait over four owner-keyed tables
//! - Embedded, idempotent schema migrations
//! - Supports in-memory databases for testing
//! - Engine transactions run as `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`
//!
//! # Example
//!
//! ```rust,no_run
//! use hashward_core::{DataHash, IntegrityEngine};
//! use hashward_sqlite::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = IntegrityEngine::new(SqliteStore::open("integrity.db")?);
//!
//! engine.register_device("alice", "laptop", "Laptop", &[2u8; 33])?;
//! engine.submit_hash("alice", "report", DataHash::digest(b"v1"), "laptop", 1_000)?;
//!
//! let record = engine.get_data_hash("alice", "report")?;
//! assert_eq!(record.device_id, "laptop");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod json;
pub mod migrate;
pub mod store;

// Re-export main types
pub use error::{Result, SqliteError};
pub use store::SqliteStore;
