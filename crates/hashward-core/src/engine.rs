//! Integrity engine
//!
//! The public surface of the crate. Every operation locks the store, so
//! operations are totally ordered, and every mutating operation runs in a
//! storage transaction, so a failed call writes nothing.
//!
//! ```rust
//! use hashward_core::{DataHash, IntegrityEngine, MemoryStore, SubmitOutcome};
//!
//! let engine = IntegrityEngine::new(MemoryStore::new());
//! engine.register_device("alice", "laptop", "Laptop", &[2u8; 33]).unwrap();
//! engine.register_device("alice", "phone", "Phone", &[3u8; 33]).unwrap();
//!
//! let v1 = DataHash::digest(b"draft one");
//! let v2 = DataHash::digest(b"draft two");
//!
//! assert_eq!(
//!     engine.submit_hash("alice", "notes", v1, "laptop", 1_000).unwrap(),
//!     SubmitOutcome::Baseline
//! );
//! engine.submit_hash("alice", "notes", v2, "phone", 2_000).unwrap();
//! assert!(engine.has_conflict("alice", "notes").unwrap());
//!
//! engine.resolve_conflict("alice", "notes", v2, "alice").unwrap();
//! assert_eq!(engine.get_data_hash("alice", "notes").unwrap().hash, v2);
//! ```

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::access::{AccessControl, OwnerOnly, Role};
use crate::clock::{Clock, SystemClock};
use crate::conflicts::ConflictTracker;
use crate::devices::DeviceRegistry;
use crate::error::{IntegrityError, IntegrityResult};
use crate::hash::{DataHash, PublicKey, PUBLIC_KEY_LEN};
use crate::hashes::HashStore;
use crate::history::IntegrityHistory;
use crate::limits::{check_id, check_name, check_proof, EngineLimits};
use crate::proof::{OpaqueProof, ProofVerifier};
use crate::storage::IntegrityStore;
use crate::types::{ConflictRecord, Device, HashRecord, HistoryEntry, SubmitOutcome};

type BoxedAccess = Box<dyn AccessControl + Send + Sync>;
type BoxedVerifier = Box<dyn ProofVerifier + Send + Sync>;
type BoxedClock = Box<dyn Clock + Send + Sync>;

/// Orchestrates device checks, hash updates, conflicts and history.
pub struct IntegrityEngine<S> {
    store: Mutex<S>,
    access: BoxedAccess,
    proofs: BoxedVerifier,
    clock: BoxedClock,
    limits: EngineLimits,
}

impl<S: IntegrityStore> IntegrityEngine<S> {
    /// Engine with owner-only access, opaque proofs, the wall clock and standard limits.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
            access: Box::new(OwnerOnly),
            proofs: Box::new(OpaqueProof),
            clock: Box::new(SystemClock),
            limits: EngineLimits::standard(),
        }
    }

    pub fn with_access_control(
        mut self,
        access: impl AccessControl + Send + Sync + 'static,
    ) -> Self {
        self.access = Box::new(access);
        self
    }

    pub fn with_proof_verifier(
        mut self,
        verifier: impl ProofVerifier + Send + Sync + 'static,
    ) -> Self {
        self.proofs = Box::new(verifier);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Consume the engine and hand back its store.
    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Register or re-register a device under `owner`.
    pub fn register_device(
        &self,
        owner: &str,
        device_id: &str,
        name: &str,
        public_key: &[u8],
    ) -> IntegrityResult<()> {
        check_id("device id", device_id)?;
        check_name(name)?;
        let public_key = PublicKey::from_slice(public_key).ok_or_else(|| {
            IntegrityError::InvalidInput(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_LEN,
                public_key.len()
            ))
        })?;

        let mut store = self.store.lock();
        store.transaction(|s| DeviceRegistry::new(s).register(owner, device_id, name, public_key))
    }

    pub fn deactivate_device(&self, owner: &str, device_id: &str) -> IntegrityResult<()> {
        check_id("device id", device_id)?;
        let mut store = self.store.lock();
        store.transaction(|s| DeviceRegistry::new(s).deactivate(owner, device_id))
    }

    pub fn is_device_active(&self, owner: &str, device_id: &str) -> IntegrityResult<bool> {
        let mut store = self.store.lock();
        Ok(DeviceRegistry::new(&mut *store).is_active(owner, device_id)?)
    }

    pub fn get_device(&self, owner: &str, device_id: &str) -> IntegrityResult<Option<Device>> {
        let mut store = self.store.lock();
        Ok(DeviceRegistry::new(&mut *store).get(owner, device_id)?)
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Assert `hash` for a data item from one of the owner's devices.
    ///
    /// The first hash for an item becomes its baseline. Resubmitting the
    /// accepted hash changes nothing. A different hash opens or extends a
    /// conflict and leaves the accepted hash as it was. Every successful
    /// call appends one `submit` history entry.
    pub fn submit_hash(
        &self,
        owner: &str,
        data_id: &str,
        hash: DataHash,
        device_id: &str,
        timestamp: i64,
    ) -> IntegrityResult<SubmitOutcome> {
        check_id("data id", data_id)?;
        check_id("device id", device_id)?;
        let limits = self.limits;

        let mut store = self.store.lock();
        store.transaction(|s| {
            if !DeviceRegistry::new(&mut *s).is_active(owner, device_id)? {
                warn!(owner, data_id, device_id, "submission from unknown or inactive device");
                return Err(IntegrityError::InvalidDevice(device_id.to_string()));
            }

            let outcome = match HashStore::new(&mut *s).find(owner, data_id)? {
                None => {
                    HashStore::new(&mut *s).set(owner, data_id, hash, device_id, timestamp)?;
                    info!(owner, data_id, %hash, device_id, "baseline hash set");
                    SubmitOutcome::Baseline
                }
                Some(current) if current.hash == hash => {
                    debug!(owner, data_id, %hash, device_id, "hash confirmed");
                    SubmitOutcome::Confirmed
                }
                Some(_) => ConflictTracker::new(&mut *s, limits)
                    .record_candidate(owner, data_id, hash, device_id, timestamp)?,
            };

            IntegrityHistory::new(&mut *s, limits.max_history).append(
                owner,
                data_id,
                HistoryEntry::submit(hash, device_id, timestamp),
            )?;
            Ok(outcome)
        })
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Check `hash` against the accepted hash, byte for byte.
    ///
    /// Device status plays no part. `proof` is bounded in size and passed
    /// to the configured [`ProofVerifier`] once the hashes match.
    pub fn verify_data(
        &self,
        owner: &str,
        data_id: &str,
        hash: DataHash,
        proof: &[u8],
    ) -> IntegrityResult<bool> {
        check_id("data id", data_id)?;
        check_proof(proof)?;

        let record = {
            let mut store = self.store.lock();
            HashStore::new(&mut *store).get(owner, data_id)?
        };

        if record.hash != hash {
            debug!(owner, data_id, stored = %record.hash, presented = %hash, "hash mismatch");
            return Err(IntegrityError::HashMismatch {
                data_id: data_id.to_string(),
                stored: record.hash,
                presented: hash,
            });
        }
        if !self.proofs.verify(&record, &hash, proof) {
            warn!(owner, data_id, proof_len = proof.len(), "proof rejected");
            return Err(IntegrityError::InvalidProof(data_id.to_string()));
        }
        Ok(true)
    }

    /// Verify another owner's data item. Requires at least a viewer role.
    pub fn verify_data_for(
        &self,
        caller: &str,
        owner: &str,
        data_id: &str,
        hash: DataHash,
        proof: &[u8],
    ) -> IntegrityResult<bool> {
        if self.access.role(caller, owner, data_id) < Role::Viewer {
            warn!(caller, owner, data_id, "verification denied");
            return Err(IntegrityError::NotAuthorized(caller.to_string()));
        }
        self.verify_data(owner, data_id, hash, proof)
    }

    // ------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------

    /// Settle the open conflict on a data item in favour of `selected`.
    ///
    /// Only the dataset owner may resolve. Returns the new accepted record.
    pub fn resolve_conflict(
        &self,
        owner: &str,
        data_id: &str,
        selected: DataHash,
        caller: &str,
    ) -> IntegrityResult<HashRecord> {
        check_id("data id", data_id)?;
        if !self.access.is_dataset_owner(caller, owner, data_id) {
            warn!(caller, owner, data_id, "resolution denied");
            return Err(IntegrityError::NotAuthorized(caller.to_string()));
        }
        let limits = self.limits;
        let now = self.clock.now_millis();

        let mut store = self.store.lock();
        store.transaction(|s| {
            ConflictTracker::new(s, limits).resolve(owner, data_id, selected, caller, now)
        })
    }

    pub fn has_conflict(&self, owner: &str, data_id: &str) -> IntegrityResult<bool> {
        let mut store = self.store.lock();
        Ok(ConflictTracker::new(&mut *store, self.limits).has_open(owner, data_id)?)
    }

    /// Conflict record for a data item, whether open or already resolved.
    pub fn get_conflict(
        &self,
        owner: &str,
        data_id: &str,
    ) -> IntegrityResult<Option<ConflictRecord>> {
        let mut store = self.store.lock();
        Ok(ConflictTracker::new(&mut *store, self.limits).get(owner, data_id)?)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get_data_hash(&self, owner: &str, data_id: &str) -> IntegrityResult<HashRecord> {
        let mut store = self.store.lock();
        HashStore::new(&mut *store).get(owner, data_id)
    }

    /// History of a data item, oldest first.
    pub fn get_integrity_history(
        &self,
        owner: &str,
        data_id: &str,
    ) -> IntegrityResult<Vec<HistoryEntry>> {
        let mut store = self.store.lock();
        Ok(IntegrityHistory::new(&mut *store, self.limits.max_history).get(owner, data_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    const KEY: [u8; 33] = [2; 33];
    const H1: DataHash = DataHash::new([1; 32]);
    const H2: DataHash = DataHash::new([2; 32]);

    fn engine() -> IntegrityEngine<MemoryStore> {
        let engine = IntegrityEngine::new(MemoryStore::new()).with_clock(FixedClock::new(5_000));
        engine.register_device("alice", "laptop", "Laptop", &KEY).unwrap();
        engine.register_device("alice", "phone", "Phone", &KEY).unwrap();
        engine
    }

    #[test]
    fn register_validates_boundary() {
        let engine = engine();
        assert!(matches!(
            engine.register_device("alice", "tablet", "Tablet", &[1u8; 32]),
            Err(IntegrityError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.register_device("alice", &"d".repeat(37), "Tablet", &KEY),
            Err(IntegrityError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.register_device("alice", "tablet", &"n".repeat(65), &KEY),
            Err(IntegrityError::InvalidInput(_))
        ));
    }

    #[test]
    fn deactivate_unknown_is_invalid_device() {
        let engine = engine();
        assert_eq!(
            engine.deactivate_device("alice", "ghost").unwrap_err(),
            IntegrityError::InvalidDevice("ghost".into())
        );
    }

    #[test]
    fn other_owners_devices_are_rejected() {
        let engine = engine();
        let err = engine.submit_hash("bob", "doc", H1, "laptop", 1).unwrap_err();
        assert_eq!(err, IntegrityError::InvalidDevice("laptop".into()));
    }

    #[test]
    fn resolution_uses_clock() {
        let engine = engine();
        engine.submit_hash("alice", "doc", H1, "laptop", 100).unwrap();
        engine.submit_hash("alice", "doc", H2, "phone", 200).unwrap();

        let record = engine.resolve_conflict("alice", "doc", H2, "alice").unwrap();
        assert_eq!(record.timestamp, 5_000);
        assert_eq!(record.device_id, "phone");
    }

    #[test]
    fn non_owner_cannot_resolve() {
        let engine = engine();
        engine.submit_hash("alice", "doc", H1, "laptop", 100).unwrap();
        engine.submit_hash("alice", "doc", H2, "phone", 200).unwrap();

        let err = engine.resolve_conflict("alice", "doc", H2, "mallory").unwrap_err();
        assert_eq!(err, IntegrityError::NotAuthorized("mallory".into()));
        assert!(engine.has_conflict("alice", "doc").unwrap());
    }

    #[test]
    fn oversized_proof_is_rejected() {
        let engine = engine();
        engine.submit_hash("alice", "doc", H1, "laptop", 100).unwrap();
        assert!(matches!(
            engine.verify_data("alice", "doc", H1, &[0u8; 129]),
            Err(IntegrityError::InvalidInput(_))
        ));
        assert!(engine.verify_data("alice", "doc", H1, &[0u8; 128]).unwrap());
    }

    #[test]
    fn into_store_returns_state() {
        let engine = engine();
        engine.submit_hash("alice", "doc", H1, "laptop", 100).unwrap();
        let store = engine.into_store();
        assert_eq!(store.device_count(), 2);
        assert!(!store.in_transaction());
    }
}
