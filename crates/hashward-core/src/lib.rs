//! Hashward Core Engine
//!
//! Tracks which content hash is the accepted state of each data item,
//! which devices asserted which hash, and how disagreements between devices
//! are detected and resolved. All state is namespaced per owner.
//!
//! # Components
//!
//! - [`DeviceRegistry`] - per-owner devices and their active flag
//! - [`HashStore`] - accepted hash per data item
//! - [`ConflictTracker`] - divergent candidates and their resolution
//! - [`IntegrityHistory`] - bounded audit window per data item
//! - [`IntegrityEngine`] - the public entry points tying them together
//!
//! # Example
//!
//! ```rust
//! use hashward_core::{DataHash, IntegrityEngine, IntegrityError, MemoryStore};
//!
//! let engine = IntegrityEngine::new(MemoryStore::new());
//! engine.register_device("alice", "laptop", "Laptop", &[2u8; 33]).unwrap();
//!
//! let hash = DataHash::digest(b"quarterly report");
//! engine.submit_hash("alice", "report", hash, "laptop", 1_000).unwrap();
//!
//! assert!(engine.verify_data("alice", "report", hash, &[]).unwrap());
//! assert!(matches!(
//!     engine.verify_data("alice", "report", DataHash::digest(b"tampered"), &[]),
//!     Err(IntegrityError::HashMismatch { .. })
//! ));
//! ```

pub mod access;
pub mod clock;
pub mod conflicts;
pub mod devices;
pub mod engine;
pub mod error;
pub mod hash;
pub mod hashes;
pub mod history;
pub mod limits;
pub mod proof;
pub mod storage;
pub mod types;

// Re-export main types at crate root
pub use access::{AccessControl, OwnerOnly, Role, RoleTable};
pub use clock::{Clock, FixedClock, SystemClock};
pub use conflicts::ConflictTracker;
pub use devices::DeviceRegistry;
pub use engine::IntegrityEngine;
pub use error::{IntegrityError, IntegrityResult};
pub use hash::{DataHash, PublicKey, HASH_LEN, PUBLIC_KEY_LEN};
pub use hashes::HashStore;
pub use history::IntegrityHistory;
pub use limits::{EngineLimits, MAX_ID_LEN, MAX_NAME_LEN, MAX_PROOF_LEN};
pub use proof::{OpaqueProof, ProofVerifier};
pub use storage::{IntegrityStore, MemoryStore, StoreError, StoreResult};
pub use types::{
    Candidate, ConflictRecord, Device, HashRecord, HistoryEntry, Operation, Resolution,
    SubmitOutcome,
};
