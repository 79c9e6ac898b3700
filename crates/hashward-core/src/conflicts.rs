//! Conflict detection and resolution
//!
//! Each data item moves through `NoConflict -> Open -> Resolved`. A resolved
//! record is terminal for its round: the next divergence replaces it with a
//! fresh open record whose `round` is one higher. Open conflicts only ever
//! grow, up to the candidate limit, and are never evicted into silence.

use tracing::{debug, info, warn};

use crate::error::{IntegrityError, IntegrityResult};
use crate::hash::DataHash;
use crate::hashes::HashStore;
use crate::history::IntegrityHistory;
use crate::limits::EngineLimits;
use crate::storage::{IntegrityStore, StoreResult};
use crate::types::{Candidate, ConflictRecord, HashRecord, HistoryEntry, Resolution, SubmitOutcome};

/// View over the conflict table.
pub struct ConflictTracker<'a, S: ?Sized> {
    store: &'a mut S,
    limits: EngineLimits,
}

impl<'a, S: IntegrityStore + ?Sized> ConflictTracker<'a, S> {
    pub fn new(store: &'a mut S, limits: EngineLimits) -> Self {
        Self { store, limits }
    }

    /// The conflict record for a data item, open or resolved.
    pub fn get(&self, owner: &str, data_id: &str) -> StoreResult<Option<ConflictRecord>> {
        self.store.conflict(owner, data_id)
    }

    pub fn has_open(&self, owner: &str, data_id: &str) -> StoreResult<bool> {
        Ok(self
            .store
            .conflict(owner, data_id)?
            .is_some_and(|r| r.is_open()))
    }

    /// Record a hash that diverges from the accepted one.
    ///
    /// Opens a conflict seeded with the accepted hash (keeping its original
    /// device and timestamp) when none is open, otherwise adds the hash to
    /// the open conflict. The accepted hash itself is never touched here.
    pub fn record_candidate(
        &mut self,
        owner: &str,
        data_id: &str,
        hash: DataHash,
        device_id: &str,
        timestamp: i64,
    ) -> IntegrityResult<SubmitOutcome> {
        let candidate = Candidate {
            hash,
            device_id: device_id.to_string(),
            timestamp,
        };

        match self.store.conflict(owner, data_id)? {
            Some(mut record) if record.is_open() => {
                if record.contains(&hash) {
                    debug!(owner, data_id, %hash, "candidate already recorded");
                    return Ok(SubmitOutcome::CandidateKnown);
                }
                if record.candidates.len() >= self.limits.max_candidates {
                    warn!(
                        owner,
                        data_id,
                        %hash,
                        limit = self.limits.max_candidates,
                        "conflict candidate list full"
                    );
                    return Err(IntegrityError::CapacityExceeded {
                        data_id: data_id.to_string(),
                        limit: self.limits.max_candidates,
                    });
                }
                record.candidates.push(candidate);
                self.store.put_conflict(owner, data_id, &record)?;
                info!(
                    owner,
                    data_id,
                    %hash,
                    candidates = record.candidates.len(),
                    "conflict candidate added"
                );
                Ok(SubmitOutcome::CandidateAdded {
                    candidates: record.candidates.len(),
                })
            }
            previous => {
                let settled = HashStore::new(&mut *self.store).get(owner, data_id)?;
                if settled.hash == hash {
                    return Ok(SubmitOutcome::Confirmed);
                }
                if self.limits.max_candidates < 2 {
                    return Err(IntegrityError::CapacityExceeded {
                        data_id: data_id.to_string(),
                        limit: self.limits.max_candidates,
                    });
                }
                let round = previous.map_or(1, |r| r.round + 1);
                let record = ConflictRecord {
                    round,
                    candidates: vec![Candidate::from(&settled), candidate],
                    is_resolved: false,
                    resolution: None,
                };
                self.store.put_conflict(owner, data_id, &record)?;
                info!(
                    owner,
                    data_id,
                    round,
                    settled = %settled.hash,
                    %hash,
                    "conflict opened"
                );
                Ok(SubmitOutcome::ConflictOpened { round })
            }
        }
    }

    /// Close the open conflict by picking one of its candidates.
    ///
    /// The chosen hash becomes the accepted hash, attributed to the device
    /// that submitted it, with `timestamp` as the resolution time.
    pub fn resolve(
        &mut self,
        owner: &str,
        data_id: &str,
        selected: DataHash,
        resolver: &str,
        timestamp: i64,
    ) -> IntegrityResult<HashRecord> {
        let mut record = match self.store.conflict(owner, data_id)? {
            Some(record) if record.is_open() => record,
            _ => return Err(IntegrityError::NoConflict(data_id.to_string())),
        };

        let device_id = record
            .candidate(&selected)
            .map(|c| c.device_id.clone())
            .ok_or_else(|| IntegrityError::InvalidResolution {
                data_id: data_id.to_string(),
                hash: selected,
            })?;

        let settled =
            HashStore::new(&mut *self.store).set(owner, data_id, selected, &device_id, timestamp)?;

        record.is_resolved = true;
        record.resolution = Some(Resolution {
            hash: selected,
            resolver: resolver.to_string(),
            timestamp,
        });
        self.store.put_conflict(owner, data_id, &record)?;

        IntegrityHistory::new(&mut *self.store, self.limits.max_history).append(
            owner,
            data_id,
            HistoryEntry::resolve(selected, device_id.as_str(), timestamp),
        )?;

        info!(
            owner,
            data_id,
            round = record.round,
            hash = %selected,
            device_id = device_id.as_str(),
            resolver,
            "conflict resolved"
        );
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Operation;
    use pretty_assertions::assert_eq;

    const H1: DataHash = DataHash::new([1; 32]);
    const H2: DataHash = DataHash::new([2; 32]);
    const H3: DataHash = DataHash::new([3; 32]);

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        HashStore::new(&mut store)
            .set("alice", "doc", H1, "laptop", 100)
            .unwrap();
        store
    }

    #[test]
    fn divergence_opens_seeded_conflict() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());

        let outcome = tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();
        assert_eq!(outcome, SubmitOutcome::ConflictOpened { round: 1 });

        let record = tracker.get("alice", "doc").unwrap().unwrap();
        assert_eq!(
            record.candidates,
            vec![
                Candidate { hash: H1, device_id: "laptop".into(), timestamp: 100 },
                Candidate { hash: H2, device_id: "phone".into(), timestamp: 200 },
            ]
        );
        assert!(tracker.has_open("alice", "doc").unwrap());
    }

    #[test]
    fn known_candidate_is_noop() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());
        tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();

        let outcome = tracker.record_candidate("alice", "doc", H2, "tablet", 300).unwrap();
        assert_eq!(outcome, SubmitOutcome::CandidateKnown);
        assert_eq!(tracker.get("alice", "doc").unwrap().unwrap().candidates.len(), 2);
    }

    #[test]
    fn full_conflict_rejects_new_candidates() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::new(3, 20));
        tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();
        tracker.record_candidate("alice", "doc", H3, "tablet", 300).unwrap();

        let err = tracker
            .record_candidate("alice", "doc", DataHash::new([4; 32]), "watch", 400)
            .unwrap_err();
        assert_eq!(
            err,
            IntegrityError::CapacityExceeded { data_id: "doc".into(), limit: 3 }
        );
        assert_eq!(tracker.get("alice", "doc").unwrap().unwrap().candidates.len(), 3);
    }

    #[test]
    fn resolve_preserves_provenance() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());
        tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();

        let settled = tracker.resolve("alice", "doc", H2, "alice", 900).unwrap();
        assert_eq!(settled.device_id, "phone");
        assert_eq!(settled.timestamp, 900);

        let record = tracker.get("alice", "doc").unwrap().unwrap();
        assert!(record.is_resolved);
        assert_eq!(record.candidates.len(), 2);
        assert_eq!(record.resolution.unwrap().resolver, "alice");

        let history = store.history("alice", "doc").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].operation, Operation::Resolve);
        assert_eq!(history[0].device_id, "phone");
    }

    #[test]
    fn resolve_without_conflict_fails() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());
        assert_eq!(
            tracker.resolve("alice", "doc", H1, "alice", 900).unwrap_err(),
            IntegrityError::NoConflict("doc".into())
        );
    }

    #[test]
    fn resolve_rejects_unknown_hash() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());
        tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();

        let err = tracker.resolve("alice", "doc", H3, "alice", 900).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidResolution { .. }));
        assert!(tracker.has_open("alice", "doc").unwrap());
    }

    #[test]
    fn divergence_after_resolution_starts_new_round() {
        let mut store = seeded();
        let mut tracker = ConflictTracker::new(&mut store, EngineLimits::standard());
        tracker.record_candidate("alice", "doc", H2, "phone", 200).unwrap();
        tracker.resolve("alice", "doc", H2, "alice", 300).unwrap();

        let outcome = tracker.record_candidate("alice", "doc", H3, "tablet", 400).unwrap();
        assert_eq!(outcome, SubmitOutcome::ConflictOpened { round: 2 });

        let record = tracker.get("alice", "doc").unwrap().unwrap();
        assert_eq!(record.candidates[0].hash, H2);
        assert_eq!(record.candidates[1].hash, H3);
        assert!(record.resolution.is_none());
    }
}
