//! SQLite storage backend implementing IntegrityStore trait

use hashward_core::{
    storage::{IntegrityStore, StoreResult},
    ConflictRecord, Device, HashRecord, HistoryEntry,
};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{Result, SqliteError};
use crate::json::{
    deserialize_candidates, deserialize_history, deserialize_resolution, hash_from_blob,
    public_key_from_blob, serialize_candidates, serialize_history, serialize_resolution,
};

/// SQLite-backed integrity store
///
/// Transactions map to `BEGIN IMMEDIATE` so a writer holds the database
/// lock from the first read of an operation until its commit.
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Create a new SQLite store from a connection
    ///
    /// The connection should already have migrations applied.
    /// Use [`crate::migrate::migrate`] to initialize a fresh database.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Create a new in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        crate::migrate::migrate(&conn)?;
        Ok(Self::new(conn))
    }

    /// Create a new file-backed SQLite store
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        crate::migrate::migrate(&conn)?;
        debug!(path = %path.display(), "opened integrity database");
        Ok(Self::new(conn))
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load_device(&self, owner: &str, device_id: &str) -> Result<Option<Device>> {
        let row = self
            .conn
            .query_row(
                "SELECT display_name, public_key, is_active
                 FROM devices
                 WHERE owner = ? AND device_id = ?",
                params![owner, device_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(display_name, key, is_active)| -> Result<Device> {
            Ok(Device {
                device_id: device_id.to_string(),
                display_name,
                public_key: public_key_from_blob(&key)?,
                is_active,
            })
        })
        .transpose()
    }

    fn store_device(&self, owner: &str, device: &Device) -> Result<()> {
        self.conn.execute(
            "INSERT INTO devices (owner, device_id, display_name, public_key, is_active)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(owner, device_id) DO UPDATE SET
                 display_name = excluded.display_name,
                 public_key = excluded.public_key,
                 is_active = excluded.is_active",
            params![
                owner,
                device.device_id,
                device.display_name,
                device.public_key.as_bytes().as_slice(),
                device.is_active,
            ],
        )?;
        Ok(())
    }

    fn load_hash(&self, owner: &str, data_id: &str) -> Result<Option<HashRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT hash, timestamp, device_id
                 FROM hashes
                 WHERE owner = ? AND data_id = ?",
                params![owner, data_id],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(hash, timestamp, device_id)| -> Result<HashRecord> {
            Ok(HashRecord {
                hash: hash_from_blob(&hash)?,
                timestamp,
                device_id,
            })
        })
        .transpose()
    }

    fn store_hash(&self, owner: &str, data_id: &str, record: &HashRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hashes (owner, data_id, hash, timestamp, device_id)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(owner, data_id) DO UPDATE SET
                 hash = excluded.hash,
                 timestamp = excluded.timestamp,
                 device_id = excluded.device_id",
            params![
                owner,
                data_id,
                record.hash.as_bytes().as_slice(),
                record.timestamp,
                record.device_id,
            ],
        )?;
        Ok(())
    }

    fn load_conflict(&self, owner: &str, data_id: &str) -> Result<Option<ConflictRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT round, candidates, is_resolved, resolution
                 FROM conflicts
                 WHERE owner = ? AND data_id = ?",
                params![owner, data_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(round, candidates, is_resolved, resolution)| -> Result<ConflictRecord> {
            Ok(ConflictRecord {
                round,
                candidates: deserialize_candidates(&candidates)?,
                is_resolved,
                resolution: deserialize_resolution(resolution)?,
            })
        })
        .transpose()
    }

    fn store_conflict(&self, owner: &str, data_id: &str, record: &ConflictRecord) -> Result<()> {
        let candidates = serialize_candidates(&record.candidates)?;
        let resolution = serialize_resolution(record.resolution.as_ref())?;

        self.conn.execute(
            "INSERT INTO conflicts (owner, data_id, round, candidates, is_resolved, resolution)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(owner, data_id) DO UPDATE SET
                 round = excluded.round,
                 candidates = excluded.candidates,
                 is_resolved = excluded.is_resolved,
                 resolution = excluded.resolution",
            params![
                owner,
                data_id,
                record.round,
                candidates,
                record.is_resolved,
                resolution,
            ],
        )?;
        Ok(())
    }

    fn load_history(&self, owner: &str, data_id: &str) -> Result<Vec<HistoryEntry>> {
        let entries: Option<String> = self
            .conn
            .query_row(
                "SELECT entries FROM history WHERE owner = ? AND data_id = ?",
                params![owner, data_id],
                |row| row.get(0),
            )
            .optional()?;

        match entries {
            Some(json) => deserialize_history(&json),
            None => Ok(Vec::new()),
        }
    }

    fn store_history(&self, owner: &str, data_id: &str, entries: &[HistoryEntry]) -> Result<()> {
        let json = serialize_history(entries)?;
        self.conn.execute(
            "INSERT INTO history (owner, data_id, entries)
             VALUES (?, ?, ?)
             ON CONFLICT(owner, data_id) DO UPDATE SET entries = excluded.entries",
            params![owner, data_id, json],
        )?;
        Ok(())
    }

    /// Run `COMMIT` or `ROLLBACK`.
    ///
    /// A failed `COMMIT` (SQLITE_BUSY while a reader holds the database)
    /// leaves the transaction open, so the flag follows the connection's
    /// autocommit state rather than the statement's result.
    fn finish(&mut self, statement: &str) -> Result<()> {
        if !self.in_transaction {
            return Err(SqliteError::Transaction(format!(
                "{} without open transaction",
                statement
            )));
        }
        let result = self.conn.execute_batch(statement);
        self.in_transaction = !self.conn.is_autocommit();
        if let Err(err) = &result {
            warn!(
                statement,
                error = %err,
                still_open = self.in_transaction,
                "transaction end failed"
            );
        }
        result.map_err(SqliteError::from)
    }
}

impl IntegrityStore for SqliteStore {
    fn device(&self, owner: &str, device_id: &str) -> StoreResult<Option<Device>> {
        Ok(self.load_device(owner, device_id)?)
    }

    fn put_device(&mut self, owner: &str, device: &Device) -> StoreResult<()> {
        Ok(self.store_device(owner, device)?)
    }

    fn hash_record(&self, owner: &str, data_id: &str) -> StoreResult<Option<HashRecord>> {
        Ok(self.load_hash(owner, data_id)?)
    }

    fn put_hash_record(
        &mut self,
        owner: &str,
        data_id: &str,
        record: &HashRecord,
    ) -> StoreResult<()> {
        Ok(self.store_hash(owner, data_id, record)?)
    }

    fn conflict(&self, owner: &str, data_id: &str) -> StoreResult<Option<ConflictRecord>> {
        Ok(self.load_conflict(owner, data_id)?)
    }

    fn put_conflict(
        &mut self,
        owner: &str,
        data_id: &str,
        record: &ConflictRecord,
    ) -> StoreResult<()> {
        Ok(self.store_conflict(owner, data_id, record)?)
    }

    fn history(&self, owner: &str, data_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.load_history(owner, data_id)?)
    }

    fn put_history(
        &mut self,
        owner: &str,
        data_id: &str,
        entries: &[HistoryEntry],
    ) -> StoreResult<()> {
        Ok(self.store_history(owner, data_id, entries)?)
    }

    fn begin(&mut self) -> StoreResult<()> {
        if self.in_transaction {
            return Err(SqliteError::Transaction("transaction already open".into()).into());
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(SqliteError::from)?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        Ok(self.finish("COMMIT")?)
    }

    fn rollback(&mut self) -> StoreResult<()> {
        Ok(self.finish("ROLLBACK")?)
    }
}
