//! In-memory tracking of open timespan events.
//!
//! The manager owns every manual descriptor it has started, keyed by
//! [`EventDescriptor::key`], until the corresponding row is finished.
//! Once a row is closed the key-to-descriptor mapping is discarded; the
//! database row is the only remaining record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use ua_core::EventDescriptor;

use crate::{Database, DbError};

/// Tracks open manual timespan events for one logical caller.
///
/// The manager does not own the database handle; callers pass it into each
/// operation, keeping the handle's lifetime under the owning scope's
/// control.
#[derive(Debug, Default)]
pub struct TimespanManager {
    pending: HashMap<String, EventDescriptor>,
}

impl TimespanManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a manual event and takes ownership of its descriptor.
    ///
    /// Returns the derived key used for the later [`finish`](Self::finish).
    /// A second start with the same key while the first is still open is
    /// rejected; callers must keep event IDs unique within their own
    /// activity namespace.
    pub fn start(
        &mut self,
        db: &mut Database,
        ide_row: i64,
        mut descriptor: EventDescriptor,
    ) -> Result<String, DbError> {
        let key = descriptor.key();
        if self.pending.contains_key(&key) {
            return Err(DbError::DuplicateKey { key });
        }
        db.start_manual(ide_row, &mut descriptor)?;
        tracing::debug!(key = %key, database_id = ?descriptor.database_id, "opened timespan event");
        self.pending.insert(key.clone(), descriptor);
        Ok(key)
    }

    /// Finishes the open event with the given key and discards its mapping.
    ///
    /// Returns the closed descriptor, `database_id` and `ended_at` filled
    /// in.
    pub fn finish(
        &mut self,
        db: &mut Database,
        key: &str,
        end_at: DateTime<Utc>,
    ) -> Result<EventDescriptor, DbError> {
        let Some(mut descriptor) = self.pending.remove(key) else {
            return Err(DbError::UnknownKey {
                key: key.to_string(),
            });
        };
        match db.finish(&mut descriptor, end_at) {
            Ok(()) => {
                tracing::debug!(key = %key, "closed timespan event");
                Ok(descriptor)
            }
            Err(err) => {
                // The row is still open; keep tracking it.
                self.pending.insert(key.to_string(), descriptor);
                Err(err)
            }
        }
    }

    /// Submits a periodic event straight through.
    ///
    /// Periodic events are pre-closed, so they never enter the pending map.
    pub fn submit_periodic(
        &mut self,
        db: &mut Database,
        ide_row: i64,
        mut descriptor: EventDescriptor,
    ) -> Result<EventDescriptor, DbError> {
        db.submit_periodic(ide_row, &mut descriptor)?;
        Ok(descriptor)
    }

    /// Number of events currently open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.pending.len()
    }

    /// Looks up an open descriptor by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EventDescriptor> {
        self.pending.get(key)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use ua_core::{ActivityId, EventId, IdeFamily, IdeInfo};

    use super::*;

    fn setup() -> (Database, i64) {
        let mut db = Database::open_in_memory().unwrap();
        let ide = IdeInfo::new("machine-1", "ide-1", IdeFamily::Desktop).unwrap();
        let ide_row = db.register_ide(&ide).unwrap();
        (db, ide_row)
    }

    fn manual(event: &str) -> EventDescriptor {
        EventDescriptor::manual(
            ActivityId::new("ide.session").unwrap(),
            EventId::new(event).unwrap(),
            true,
            Utc::now(),
            None,
        )
    }

    #[test]
    fn start_then_finish_discards_mapping() {
        let (mut db, ide_row) = setup();
        let mut manager = TimespanManager::new();

        let key = manager.start(&mut db, ide_row, manual("window-1")).unwrap();
        assert_eq!(key, "ide.session#window-1");
        assert_eq!(manager.open_count(), 1);

        let closed = manager
            .finish(&mut db, &key, Utc::now() + Duration::seconds(1))
            .unwrap();
        assert!(closed.is_finished());
        assert!(closed.database_id.is_some());
        assert_eq!(manager.open_count(), 0);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let (mut db, ide_row) = setup();
        let mut manager = TimespanManager::new();

        manager.start(&mut db, ide_row, manual("window-1")).unwrap();
        let err = manager
            .start(&mut db, ide_row, manual("window-1"))
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { .. }));
        assert_eq!(manager.open_count(), 1);
    }

    #[test]
    fn finishing_unknown_key_fails() {
        let (mut db, _ide_row) = setup();
        let mut manager = TimespanManager::new();
        let err = manager
            .finish(&mut db, "ide.session#nope", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownKey { .. }));
    }

    #[test]
    fn failed_finish_keeps_event_open() {
        let (mut db, ide_row) = setup();
        let mut manager = TimespanManager::new();
        let key = manager.start(&mut db, ide_row, manual("window-1")).unwrap();

        let err = manager
            .finish(&mut db, &key, Utc::now() - Duration::hours(1))
            .unwrap_err();
        assert!(matches!(err, DbError::InvertedInterval { .. }));
        assert_eq!(manager.open_count(), 1);

        // A correct finish still works afterwards.
        manager
            .finish(&mut db, &key, Utc::now() + Duration::seconds(1))
            .unwrap();
        assert_eq!(manager.open_count(), 0);
    }

    #[test]
    fn periodic_events_bypass_the_pending_map() {
        let (mut db, ide_row) = setup();
        let mut manager = TimespanManager::new();
        let start = Utc::now();
        let descriptor = EventDescriptor::periodic(
            ActivityId::new("indexing").unwrap(),
            EventId::new("run-1").unwrap(),
            false,
            start,
            start + Duration::seconds(10),
            None,
        );

        let closed = manager.submit_periodic(&mut db, ide_row, descriptor).unwrap();
        assert!(closed.database_id.is_some());
        assert_eq!(manager.open_count(), 0);
    }
}
