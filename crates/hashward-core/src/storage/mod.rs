//! Storage abstraction for integrity state
//!
//! The engine keeps four owner-namespaced tables (devices, hashes,
//! conflicts, history) behind the `IntegrityStore` trait. Implementations
//! exist for:
//!
//! - **Memory**: In-memory storage for tests and short-lived processes (`MemoryStore`)
//! - **SQLite**: Native SQLite via rusqlite (separate crate, `hashward-sqlite`)
//!
//! # Example
//!
//! ```rust
//! use hashward_core::storage::{IntegrityStore, MemoryStore};
//! use hashward_core::{DataHash, HashRecord};
//!
//! let mut store = MemoryStore::new();
//!
//! let record = HashRecord {
//!     hash: DataHash::digest(b"report-v1"),
//!     timestamp: 1704067200000,
//!     device_id: "laptop".to_string(),
//! };
//!
//! store.put_hash_record("alice", "report", &record).unwrap();
//! let retrieved = store.hash_record("alice", "report").unwrap();
//! assert_eq!(retrieved, Some(record));
//! ```

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::IntegrityStore;
