//! In-memory storage backend
//!
//! A simple HashMap-based implementation for testing and development.
//! Not suitable for production use due to lack of persistence.

use std::collections::HashMap;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::IntegrityStore;
use crate::types::{ConflictRecord, Device, HashRecord, HistoryEntry};

/// `(owner, id)` table key
type Key = (String, String);

fn key(owner: &str, id: &str) -> Key {
    (owner.to_string(), id.to_string())
}

#[derive(Debug, Clone, Default)]
struct Tables {
    devices: HashMap<Key, Device>,
    hashes: HashMap<Key, HashRecord>,
    conflicts: HashMap<Key, ConflictRecord>,
    history: HashMap<Key, Vec<HistoryEntry>>,
}

/// In-memory integrity store.
///
/// Transactions snapshot all four tables on `begin` and restore the
/// snapshot on `rollback`, so every mutating engine call copies the whole
/// store. Meant for tests and small embedded use; large state belongs in a
/// persistent backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of devices across all owners (for testing).
    pub fn device_count(&self) -> usize {
        self.tables.devices.len()
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl IntegrityStore for MemoryStore {
    fn device(&self, owner: &str, device_id: &str) -> StoreResult<Option<Device>> {
        Ok(self.tables.devices.get(&key(owner, device_id)).cloned())
    }

    fn put_device(&mut self, owner: &str, device: &Device) -> StoreResult<()> {
        self.tables
            .devices
            .insert(key(owner, &device.device_id), device.clone());
        Ok(())
    }

    fn hash_record(&self, owner: &str, data_id: &str) -> StoreResult<Option<HashRecord>> {
        Ok(self.tables.hashes.get(&key(owner, data_id)).cloned())
    }

    fn put_hash_record(
        &mut self,
        owner: &str,
        data_id: &str,
        record: &HashRecord,
    ) -> StoreResult<()> {
        self.tables.hashes.insert(key(owner, data_id), record.clone());
        Ok(())
    }

    fn conflict(&self, owner: &str, data_id: &str) -> StoreResult<Option<ConflictRecord>> {
        Ok(self.tables.conflicts.get(&key(owner, data_id)).cloned())
    }

    fn put_conflict(
        &mut self,
        owner: &str,
        data_id: &str,
        record: &ConflictRecord,
    ) -> StoreResult<()> {
        self.tables
            .conflicts
            .insert(key(owner, data_id), record.clone());
        Ok(())
    }

    fn history(&self, owner: &str, data_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self
            .tables
            .history
            .get(&key(owner, data_id))
            .cloned()
            .unwrap_or_default())
    }

    fn put_history(
        &mut self,
        owner: &str,
        data_id: &str,
        entries: &[HistoryEntry],
    ) -> StoreResult<()> {
        self.tables
            .history
            .insert(key(owner, data_id), entries.to_vec());
        Ok(())
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("commit without open transaction".into()))
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| StoreError::Transaction("rollback without open transaction".into()))?;
        self.tables = snapshot;
        Ok(())
    }
}
