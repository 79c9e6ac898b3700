//! Rolling audit window per data item
//!
//! Entries are appended in call order. Once the window is full the oldest
//! entry is dropped, so the history is a bounded view and not a ledger.

use crate::storage::{IntegrityStore, StoreResult};
use crate::types::HistoryEntry;

/// View over the history table.
pub struct IntegrityHistory<'a, S: ?Sized> {
    store: &'a mut S,
    max_entries: usize,
}

impl<'a, S: IntegrityStore + ?Sized> IntegrityHistory<'a, S> {
    pub fn new(store: &'a mut S, max_entries: usize) -> Self {
        Self { store, max_entries }
    }

    pub fn append(&mut self, owner: &str, data_id: &str, entry: HistoryEntry) -> StoreResult<()> {
        let mut entries = self.store.history(owner, data_id)?;
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }
        self.store.put_history(owner, data_id, &entries)
    }

    pub fn get(&self, owner: &str, data_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        self.store.history(owner, data_id)
    }
}
