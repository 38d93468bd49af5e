//! Schema migrations.
//!
//! The current schema version lives in the single-row `meta` table. The
//! runner reads it, applies every pending script strictly in ascending
//! version order, and bumps `meta.version` inside the same transaction as
//! the DDL it guards. A failed migration rolls back as a unit, leaving the
//! store at the last successfully committed version. Re-running against an
//! already-migrated store is a no-op.

use rusqlite::Connection;

use crate::DbError;

/// One versioned schema transformation.
pub(crate) struct Migration {
    pub version: i64,
    pub sql: &'static str,
}

/// v1: initial schema.
///
/// `meta` gets its version row from the runner, not from the script, so
/// every migration is version-stamped the same way.
pub(crate) const MIGRATION_V1: &str = "
    CREATE TABLE meta (
        version INTEGER NOT NULL
    );

    CREATE TABLE ide (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        machine_id TEXT NOT NULL,
        ide_id TEXT NOT NULL,
        family TEXT NOT NULL
    );

    CREATE UNIQUE INDEX idx_ide_identity ON ide(machine_id, ide_id, family);

    -- Append-only counter log: the value of a counter over a window is the
    -- sum of diff across its rows. Rows are never updated or deleted.
    CREATE TABLE counterUserActivity (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        activity_id TEXT NOT NULL,
        ide_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        diff INTEGER NOT NULL,
        extra TEXT,
        FOREIGN KEY (ide_id) REFERENCES ide(id)
    );

    CREATE INDEX idx_counter_activity_created
        ON counterUserActivity(activity_id, created_at);

    CREATE TABLE timespanUserActivity (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        activity_id TEXT NOT NULL,
        ide_id INTEGER NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        extra TEXT,
        FOREIGN KEY (ide_id) REFERENCES ide(id)
    );

    CREATE INDEX idx_timespan_activity_started
        ON timespanUserActivity(activity_id, started_at);
";

/// v2: explicit finished flag on timespan rows.
///
/// Pre-existing rows default to 0: data written before the finished
/// concept existed is treated as unfinished/stale.
pub(crate) const MIGRATION_V2: &str = "
    ALTER TABLE timespanUserActivity ADD COLUMN is_finished INTEGER DEFAULT 0;
";

pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: MIGRATION_V1,
    },
    Migration {
        version: 2,
        sql: MIGRATION_V2,
    },
];

/// Latest schema version the code understands.
pub const SCHEMA_VERSION: i64 = 2;

/// Reads the stored schema version, or 0 if `meta` does not exist yet.
pub(crate) fn stored_version(conn: &Connection) -> Result<i64, DbError> {
    let meta_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'meta'",
        [],
        |row| row.get::<_, i64>(0).map(|count| count > 0),
    )?;
    if !meta_exists {
        return Ok(0);
    }
    let version = conn
        .query_row("SELECT version FROM meta", [], |row| row.get(0))
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(version.unwrap_or(0))
}

/// Applies every migration in `migrations` newer than the stored version.
pub(crate) fn run_migrations(
    conn: &mut Connection,
    migrations: &[Migration],
) -> Result<(), DbError> {
    let current = stored_version(conn)?;
    for migration in migrations {
        if migration.version <= current {
            continue;
        }
        tracing::debug!(version = migration.version, "applying migration");
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute("DELETE FROM meta", [])?;
        tx.execute(
            "INSERT INTO meta (version) VALUES (?)",
            [migration.version],
        )?;
        tx.commit()?;
    }
    Ok(())
}
