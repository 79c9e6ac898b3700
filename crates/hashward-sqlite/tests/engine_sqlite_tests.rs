//! Integrity engine running on the SQLite backend

use hashward_core::{
    DataHash, FixedClock, IntegrityEngine, IntegrityError, Operation, SubmitOutcome,
};
use hashward_sqlite::SqliteStore;
use pretty_assertions::assert_eq;

fn hash(n: u8) -> DataHash {
    DataHash::new([n; 32])
}

fn engine_with_devices(store: SqliteStore) -> IntegrityEngine<SqliteStore> {
    let engine = IntegrityEngine::new(store).with_clock(FixedClock::new(50_000));
    engine
        .register_device("alice", "laptop", "Laptop", &[2u8; 33])
        .unwrap();
    engine
        .register_device("alice", "phone", "Phone", &[3u8; 33])
        .unwrap();
    engine
}

#[test]
fn test_conflict_lifecycle() {
    let engine = engine_with_devices(SqliteStore::in_memory().unwrap());

    assert_eq!(
        engine.submit_hash("alice", "doc", hash(1), "laptop", 100).unwrap(),
        SubmitOutcome::Baseline
    );
    assert_eq!(
        engine.submit_hash("alice", "doc", hash(2), "phone", 200).unwrap(),
        SubmitOutcome::ConflictOpened { round: 1 }
    );
    assert!(engine.has_conflict("alice", "doc").unwrap());
    assert_eq!(engine.get_data_hash("alice", "doc").unwrap().hash, hash(1));

    let settled = engine
        .resolve_conflict("alice", "doc", hash(2), "alice")
        .unwrap();
    assert_eq!(settled.device_id, "phone");
    assert_eq!(settled.timestamp, 50_000);
    assert!(!engine.has_conflict("alice", "doc").unwrap());

    let conflict = engine.get_conflict("alice", "doc").unwrap().unwrap();
    assert!(conflict.is_resolved);
    assert_eq!(conflict.resolution.unwrap().hash, hash(2));

    let ops: Vec<Operation> = engine
        .get_integrity_history("alice", "doc")
        .unwrap()
        .iter()
        .map(|e| e.operation)
        .collect();
    assert_eq!(ops, vec![Operation::Submit, Operation::Submit, Operation::Resolve]);
}

#[test]
fn test_failed_operation_rolls_back() {
    let engine = engine_with_devices(SqliteStore::in_memory().unwrap());
    engine.submit_hash("alice", "doc", hash(1), "laptop", 100).unwrap();
    engine.submit_hash("alice", "doc", hash(2), "phone", 200).unwrap();

    let err = engine
        .resolve_conflict("alice", "doc", hash(3), "alice")
        .unwrap_err();
    assert!(matches!(err, IntegrityError::InvalidResolution { .. }));

    assert!(engine.has_conflict("alice", "doc").unwrap());
    assert_eq!(engine.get_integrity_history("alice", "doc").unwrap().len(), 2);

    // The store is usable again after the rollback
    engine.submit_hash("alice", "doc", hash(1), "phone", 300).unwrap();
    assert_eq!(engine.get_integrity_history("alice", "doc").unwrap().len(), 3);
}

#[test]
fn test_history_window_on_disk() {
    let engine = engine_with_devices(SqliteStore::in_memory().unwrap());
    for n in 0..25i64 {
        engine
            .submit_hash("alice", "doc", hash(1), "laptop", n)
            .unwrap();
    }

    let history = engine.get_integrity_history("alice", "doc").unwrap();
    assert_eq!(history.len(), 20);
    assert_eq!(history.first().unwrap().timestamp, 5);
    assert_eq!(history.last().unwrap().timestamp, 24);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("integrity.db");

    {
        let engine = engine_with_devices(SqliteStore::open(&path).unwrap());
        engine.submit_hash("alice", "doc", hash(1), "laptop", 100).unwrap();
        engine.submit_hash("alice", "doc", hash(2), "phone", 200).unwrap();
        engine.deactivate_device("alice", "phone").unwrap();
    }

    let engine = IntegrityEngine::new(SqliteStore::open(&path).unwrap());
    assert_eq!(engine.get_data_hash("alice", "doc").unwrap().hash, hash(1));
    assert!(engine.has_conflict("alice", "doc").unwrap());
    assert!(engine.is_device_active("alice", "laptop").unwrap());
    assert!(!engine.is_device_active("alice", "phone").unwrap());

    let device = engine.get_device("alice", "phone").unwrap().unwrap();
    assert_eq!(device.display_name, "Phone");
    assert_eq!(device.public_key.as_bytes(), &[3u8; 33]);

    assert_eq!(
        engine.submit_hash("alice", "doc", hash(3), "phone", 300).unwrap_err(),
        IntegrityError::InvalidDevice("phone".into())
    );
    assert!(engine.verify_data("alice", "doc", hash(1), &[]).unwrap());
}

#[test]
fn test_locked_commit_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integrity.db");

    let store = SqliteStore::open(&path).unwrap();
    store
        .connection()
        .busy_timeout(std::time::Duration::ZERO)
        .unwrap();
    let engine = engine_with_devices(store);

    // A second connection holds a read lock, so COMMIT cannot take the database
    let reader = SqliteStore::open(&path).unwrap();
    let reader = reader.connection();
    reader.execute_batch("BEGIN").unwrap();
    let _: i64 = reader
        .query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))
        .unwrap();

    let err = engine
        .submit_hash("alice", "doc", hash(1), "laptop", 1)
        .unwrap_err();
    assert!(matches!(err, IntegrityError::Store(_)));
    assert!(matches!(
        engine.get_data_hash("alice", "doc"),
        Err(IntegrityError::DataNotFound(_))
    ));
    assert!(engine.get_integrity_history("alice", "doc").unwrap().is_empty());

    reader.execute_batch("COMMIT").unwrap();

    assert_eq!(
        engine.submit_hash("alice", "doc", hash(1), "laptop", 2).unwrap(),
        SubmitOutcome::Baseline
    );

    let other = SqliteStore::open(&path).unwrap();
    let count: i64 = other
        .connection()
        .query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
