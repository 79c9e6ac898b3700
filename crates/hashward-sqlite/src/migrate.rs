//! Schema migrations for the integrity tables
//!
//! Migrations are embedded at build time and recorded in `schema_migrations`.
//! A database that records a version this build does not know was written
//! by a newer Hashward and is refused rather than opened half-understood.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, SqliteError};

/// Embedded migrations, in apply order
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "000",
        include_str!("../migrations/000_create_schema_migrations.sql"),
    ),
    (
        "001",
        include_str!("../migrations/001_create_integrity_tables.sql"),
    ),
];

/// Bring the database up to the latest schema.
///
/// Returns how many migrations were applied; zero for an up-to-date
/// database. Each migration commits on its own, so an interrupted run
/// resumes where it stopped.
///
/// # Errors
///
/// `SqliteError::Migration` when the database carries a version newer than
/// this build, otherwise any SQLite error from applying a migration.
pub fn migrate(conn: &Connection) -> Result<usize> {
    let applied = applied_versions(conn)?;

    if let Some(unknown) = applied
        .iter()
        .find(|v| !MIGRATIONS.iter().any(|(known, _)| *known == v.as_str()))
    {
        return Err(SqliteError::Migration(format!(
            "database has schema version {} unknown to this build",
            unknown
        )));
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| !applied.iter().any(|v| v == *version))
        .collect();

    for &&(version, sql) in &pending {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?, CURRENT_TIMESTAMP)",
            [version],
        )?;
        tx.commit()?;
        debug!(version, "applied migration");
    }

    if !pending.is_empty() {
        info!(applied = pending.len(), "integrity schema migrated");
    }
    Ok(pending.len())
}

/// Latest applied schema version, `None` for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<Option<String>> {
    Ok(applied_versions(conn)?.into_iter().max())
}

/// Versions recorded in `schema_migrations`; empty before migration 000.
fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let has_table = conn
        .prepare(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
        )?
        .exists([])?;
    if !has_table {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}
