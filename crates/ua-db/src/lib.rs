//! Storage layer for the user-activity database.
//!
//! Provides the event-sourced local activity store: an append-only counter
//! log and a timespan event table, both attributed to IDE installations,
//! persisted in a single embedded SQLite file.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Use separate `Database` instances per thread
//!
//! Every mutation is a single statement or a single transaction, so a caller
//! torn down mid-write leaves either a fully committed row or nothing.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format (always UTC), so
//! lexicographic ordering matches chronological ordering and window queries
//! compare strings directly. Booleans are 0/1 integers. The `extra` column
//! on both activity tables is an opaque caller-owned blob (nullable TEXT).
//!
//! Schema evolution goes through [`migrations`]; the current version is
//! recorded in the single-row `meta` table.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use thiserror::Error;

use ua_core::{
    ActivityId, EventDescriptor, IdeInfo, TimestampParseError, format_timestamp, is_stale,
    parse_timestamp,
};

mod manager;
pub mod migrations;
pub mod testing;

pub use manager::TimespanManager;
pub use migrations::SCHEMA_VERSION;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// An I/O error while provisioning the database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse a stored timestamp.
    #[error(transparent)]
    Timestamp(#[from] TimestampParseError),
    /// The descriptor has no database ID yet; the event was never persisted.
    #[error("event {key} has not been persisted")]
    NotPersisted { key: String },
    /// The event was already finished; finishing twice is a contract
    /// violation.
    #[error("event {key} is already finished")]
    AlreadyFinished { key: String },
    /// The descriptor was already persisted; starting it twice is a
    /// contract violation.
    #[error("event {key} is already persisted")]
    AlreadyPersisted { key: String },
    /// A periodic descriptor was handed to the manual-start path, or a
    /// manual one to the periodic path.
    #[error("event {key} has the wrong lifecycle for this operation")]
    WrongLifecycle { key: String },
    /// The event interval ends before it starts.
    #[error("event {key} ends at {ended_at} before it starts at {started_at}")]
    InvertedInterval {
        key: String,
        started_at: String,
        ended_at: String,
    },
    /// An event with the same key is already open in the manager.
    #[error("event {key} is already open")]
    DuplicateKey { key: String },
    /// No open event with this key is known to the manager.
    #[error("no open event with key {key}")]
    UnknownKey { key: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A persisted counter log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterRecord {
    pub id: i64,
    pub activity_id: String,
    pub ide_row: i64,
    pub created_at: String,
    pub diff: i64,
    pub extra: Option<String>,
}

/// A persisted timespan row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimespanRecord {
    pub id: i64,
    pub activity_id: String,
    pub ide_row: i64,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub is_finished: bool,
    pub extra: Option<String>,
}

/// Most recent write per activity, across both stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLastSeen {
    pub activity_id: String,
    pub kind: String,
    pub last_seen: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// Pending schema migrations are applied on open; see [`migrations`].
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&mut conn, migrations::MIGRATIONS)?;
        Ok(Self { conn })
    }

    /// Returns the stored schema version.
    pub fn schema_version(&self) -> Result<i64, DbError> {
        migrations::stored_version(&self.conn)
    }

    /// Returns the row ID for an IDE installation, inserting it on first
    /// sight.
    ///
    /// The row is immutable once created; repeated calls with the same
    /// identity return the same ID.
    pub fn register_ide(&mut self, ide: &IdeInfo) -> Result<i64, DbError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM ide WHERE machine_id = ? AND ide_id = ? AND family = ?",
                params![ide.machine_id, ide.ide_id, ide.family.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO ide (machine_id, ide_id, family) VALUES (?, ?, ?)",
            params![ide.machine_id, ide.ide_id, ide.family.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(ide_row = id, ide_id = %ide.ide_id, "registered IDE installation");
        Ok(id)
    }

    /// Appends one signed delta to a counter activity.
    ///
    /// No aggregation happens at write time; the log is append-only.
    /// Returns the new row ID.
    pub fn submit_direct(
        &mut self,
        ide_row: i64,
        activity: &ActivityId,
        diff: i64,
        at: DateTime<Utc>,
        extra: Option<&str>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "
            INSERT INTO counterUserActivity (activity_id, ide_id, created_at, diff, extra)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![activity.as_str(), ide_row, format_timestamp(at), diff, extra],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sums counter deltas for an activity over `[from, to)`.
    ///
    /// Returns 0 when no rows match, and 0 for an empty window
    /// (`to <= from`); never an error for either.
    pub fn activity_sum(
        &self,
        activity: &ActivityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        if to <= from {
            return Ok(0);
        }
        let sum: Option<i64> = self.conn.query_row(
            "
            SELECT SUM(diff) FROM counterUserActivity
            WHERE activity_id = ? AND created_at >= ? AND created_at < ?
            ",
            params![
                activity.as_str(),
                format_timestamp(from),
                format_timestamp(to)
            ],
            |row| row.get(0),
        )?;
        Ok(sum.unwrap_or(0))
    }

    /// Lists counter rows for an activity in insertion order.
    pub fn counter_records(&self, activity: &ActivityId) -> Result<Vec<CounterRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, activity_id, ide_id, created_at, diff, extra
            FROM counterUserActivity
            WHERE activity_id = ?
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([activity.as_str()], |row| {
            Ok(CounterRecord {
                id: row.get(0)?,
                activity_id: row.get(1)?,
                ide_row: row.get(2)?,
                created_at: row.get(3)?,
                diff: row.get(4)?,
                extra: row.get(5)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Persists a manual timespan event as an unfinished row.
    ///
    /// Sets `descriptor.database_id` so a later [`finish`](Self::finish)
    /// can update the row. Rejects periodic descriptors and descriptors
    /// that were already persisted.
    pub fn start_manual(
        &mut self,
        ide_row: i64,
        descriptor: &mut EventDescriptor,
    ) -> Result<(), DbError> {
        if descriptor.is_periodic {
            return Err(DbError::WrongLifecycle {
                key: descriptor.key(),
            });
        }
        if descriptor.database_id.is_some() {
            return Err(DbError::AlreadyPersisted {
                key: descriptor.key(),
            });
        }
        self.conn.execute(
            "
            INSERT INTO timespanUserActivity
            (activity_id, ide_id, started_at, ended_at, is_finished, extra)
            VALUES (?, ?, ?, NULL, 0, ?)
            ",
            params![
                descriptor.activity.as_str(),
                ide_row,
                format_timestamp(descriptor.started_at),
                descriptor.extra,
            ],
        )?;
        descriptor.database_id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Finishes a manual timespan event.
    ///
    /// Updates the row identified by `descriptor.database_id` in a single
    /// statement, setting `ended_at` and `is_finished`. Finishing an
    /// unpersisted or already-finished descriptor, or ending before the
    /// start, is a contract violation.
    pub fn finish(
        &mut self,
        descriptor: &mut EventDescriptor,
        end_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let Some(database_id) = descriptor.database_id else {
            return Err(DbError::NotPersisted {
                key: descriptor.key(),
            });
        };
        if descriptor.is_finished() {
            return Err(DbError::AlreadyFinished {
                key: descriptor.key(),
            });
        }
        if end_at < descriptor.started_at {
            return Err(DbError::InvertedInterval {
                key: descriptor.key(),
                started_at: format_timestamp(descriptor.started_at),
                ended_at: format_timestamp(end_at),
            });
        }
        let updated = self.conn.execute(
            "
            UPDATE timespanUserActivity
            SET ended_at = ?, is_finished = 1
            WHERE id = ? AND is_finished = 0
            ",
            params![format_timestamp(end_at), database_id],
        )?;
        if updated == 0 {
            return Err(DbError::AlreadyFinished {
                key: descriptor.key(),
            });
        }
        descriptor.ended_at = Some(end_at);
        Ok(())
    }

    /// Persists a periodic timespan event, already finished.
    ///
    /// The row is inserted with both endpoints and `is_finished = 1` in one
    /// statement; no unfinished state is ever observable.
    pub fn submit_periodic(
        &mut self,
        ide_row: i64,
        descriptor: &mut EventDescriptor,
    ) -> Result<(), DbError> {
        if !descriptor.is_periodic {
            return Err(DbError::WrongLifecycle {
                key: descriptor.key(),
            });
        }
        let Some(ended_at) = descriptor.ended_at else {
            return Err(DbError::WrongLifecycle {
                key: descriptor.key(),
            });
        };
        if ended_at < descriptor.started_at {
            return Err(DbError::InvertedInterval {
                key: descriptor.key(),
                started_at: format_timestamp(descriptor.started_at),
                ended_at: format_timestamp(ended_at),
            });
        }
        self.conn.execute(
            "
            INSERT INTO timespanUserActivity
            (activity_id, ide_id, started_at, ended_at, is_finished, extra)
            VALUES (?, ?, ?, ?, 1, ?)
            ",
            params![
                descriptor.activity.as_str(),
                ide_row,
                format_timestamp(descriptor.started_at),
                format_timestamp(ended_at),
                descriptor.extra,
            ],
        )?;
        descriptor.database_id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Lists unfinished timespan rows for an activity, oldest first.
    ///
    /// Staleness is classified by the consumer via
    /// [`ua_core::is_stale`]; the store performs no automatic cleanup.
    pub fn unfinished_events(
        &self,
        activity: &ActivityId,
    ) -> Result<Vec<TimespanRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, activity_id, ide_id, started_at, ended_at, is_finished, extra
            FROM timespanUserActivity
            WHERE activity_id = ? AND is_finished = 0
            ORDER BY started_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([activity.as_str()], |row| {
            Ok(TimespanRecord {
                id: row.get(0)?,
                activity_id: row.get(1)?,
                ide_row: row.get(2)?,
                started_at: row.get(3)?,
                ended_at: row.get(4)?,
                is_finished: row.get::<_, i64>(5)? != 0,
                extra: row.get(6)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Lists unfinished rows a reader applying `threshold` must treat as
    /// stale, oldest first.
    ///
    /// The `can_be_stale` flag is carried on the in-memory descriptor, not
    /// in the row, so this query assumes it was set; callers tracking
    /// events opened without the flag filter the result themselves.
    pub fn stale_events(
        &self,
        activity: &ActivityId,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<TimespanRecord>, DbError> {
        let mut stale = Vec::new();
        for record in self.unfinished_events(activity)? {
            let started_at = parse_timestamp(&record.started_at)?;
            if is_stale(started_at, true, threshold) {
                stale.push(record);
            }
        }
        Ok(stale)
    }

    /// Fetches one timespan row by ID.
    pub fn timespan_record(&self, id: i64) -> Result<Option<TimespanRecord>, DbError> {
        self.conn
            .query_row(
                "
                SELECT id, activity_id, ide_id, started_at, ended_at, is_finished, extra
                FROM timespanUserActivity
                WHERE id = ?
                ",
                [id],
                |row| {
                    Ok(TimespanRecord {
                        id: row.get(0)?,
                        activity_id: row.get(1)?,
                        ide_row: row.get(2)?,
                        started_at: row.get(3)?,
                        ended_at: row.get(4)?,
                        is_finished: row.get::<_, i64>(5)? != 0,
                        extra: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(DbError::from)
    }

    /// Finishes a timespan row by ID, without a descriptor.
    ///
    /// Used by out-of-process callers (e.g., the CLI) that persisted the
    /// row in an earlier invocation. The same contract applies: the row
    /// must exist, be unfinished, and end no earlier than it started.
    pub fn finish_by_id(&mut self, id: i64, end_at: DateTime<Utc>) -> Result<(), DbError> {
        let Some(record) = self.timespan_record(id)? else {
            return Err(DbError::NotPersisted {
                key: format!("row {id}"),
            });
        };
        if record.is_finished {
            return Err(DbError::AlreadyFinished {
                key: format!("row {id}"),
            });
        }
        let ended_at = format_timestamp(end_at);
        if ended_at < record.started_at {
            return Err(DbError::InvertedInterval {
                key: format!("row {id}"),
                started_at: record.started_at,
                ended_at,
            });
        }
        self.conn.execute(
            "
            UPDATE timespanUserActivity
            SET ended_at = ?, is_finished = 1
            WHERE id = ? AND is_finished = 0
            ",
            params![ended_at, id],
        )?;
        Ok(())
    }

    /// Lists the most recent write per activity across both stores,
    /// newest first.
    pub fn activity_overview(&self) -> Result<Vec<ActivityLastSeen>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT activity_id, kind, MAX(at) AS last_seen FROM (
                SELECT activity_id, 'counter' AS kind, created_at AS at
                FROM counterUserActivity
                UNION ALL
                SELECT activity_id, 'timespan' AS kind, started_at AS at
                FROM timespanUserActivity
            )
            GROUP BY activity_id, kind
            ORDER BY last_seen DESC, activity_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ActivityLastSeen {
                activity_id: row.get(0)?,
                kind: row.get(1)?,
                last_seen: row.get(2)?,
            })
        })?;
        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }
}
