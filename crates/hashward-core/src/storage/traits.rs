//! Storage trait definitions

use tracing::warn;

use crate::storage::error::{StoreError, StoreResult};
use crate::types::{ConflictRecord, Device, HashRecord, HistoryEntry};

/// Key-value tables backing the integrity engine.
///
/// Every table is keyed by owner first, so no record is ever visible
/// across owners. Records are only ever read and overwritten; nothing in
/// the engine deletes them.
///
/// Writers group their reads and writes with [`IntegrityStore::transaction`]
/// so a failed operation leaves every table untouched.
pub trait IntegrityStore {
    /// Retrieve a device registered under `owner`.
    fn device(&self, owner: &str, device_id: &str) -> StoreResult<Option<Device>>;

    /// Insert or overwrite a device keyed by `(owner, device.device_id)`.
    fn put_device(&mut self, owner: &str, device: &Device) -> StoreResult<()>;

    /// Retrieve the accepted hash for a data item.
    fn hash_record(&self, owner: &str, data_id: &str) -> StoreResult<Option<HashRecord>>;

    /// Insert or overwrite the accepted hash for a data item.
    fn put_hash_record(&mut self, owner: &str, data_id: &str, record: &HashRecord)
        -> StoreResult<()>;

    /// Retrieve the conflict record (open or resolved) for a data item.
    fn conflict(&self, owner: &str, data_id: &str) -> StoreResult<Option<ConflictRecord>>;

    /// Insert or overwrite the conflict record for a data item.
    fn put_conflict(
        &mut self,
        owner: &str,
        data_id: &str,
        record: &ConflictRecord,
    ) -> StoreResult<()>;

    /// Retrieve the history of a data item, oldest first. Empty when unknown.
    fn history(&self, owner: &str, data_id: &str) -> StoreResult<Vec<HistoryEntry>>;

    /// Replace the history of a data item.
    fn put_history(&mut self, owner: &str, data_id: &str, entries: &[HistoryEntry])
        -> StoreResult<()>;

    /// Open a transaction. Nested transactions are not supported.
    fn begin(&mut self) -> StoreResult<()>;

    /// Make every write since `begin` durable.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard every write since `begin`.
    fn rollback(&mut self) -> StoreResult<()>;

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    ///
    /// A failed commit is rolled back as well. The first error is returned
    /// even when the rollback also fails.
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.begin()?;
        let outcome = f(self).and_then(|value| self.commit().map(|()| value).map_err(E::from));
        if outcome.is_err() {
            if let Err(err) = self.rollback() {
                warn!(error = %err, "rollback after failed transaction");
            }
        }
        outcome
    }
}
