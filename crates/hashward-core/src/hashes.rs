//! Accepted hash per data item

use crate::error::{IntegrityError, IntegrityResult};
use crate::hash::DataHash;
use crate::storage::{IntegrityStore, StoreResult};
use crate::types::HashRecord;

/// View over the hash table.
///
/// `set` overwrites unconditionally; deciding when an overwrite is allowed
/// is the engine's job.
pub struct HashStore<'a, S: ?Sized> {
    store: &'a mut S,
}

impl<'a, S: IntegrityStore + ?Sized> HashStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn get(&self, owner: &str, data_id: &str) -> IntegrityResult<HashRecord> {
        self.find(owner, data_id)?
            .ok_or_else(|| IntegrityError::DataNotFound(data_id.to_string()))
    }

    pub fn find(&self, owner: &str, data_id: &str) -> StoreResult<Option<HashRecord>> {
        self.store.hash_record(owner, data_id)
    }

    pub fn set(
        &mut self,
        owner: &str,
        data_id: &str,
        hash: DataHash,
        device_id: &str,
        timestamp: i64,
    ) -> StoreResult<HashRecord> {
        let record = HashRecord {
            hash,
            timestamp,
            device_id: device_id.to_string(),
        };
        self.store.put_hash_record(owner, data_id, &record)?;
        Ok(record)
    }
}
