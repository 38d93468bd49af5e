//! In-memory handles for timespan events.
//!
//! An [`EventDescriptor`] is issued when a timespan event is created and
//! owned by the issuing manager until the corresponding row is closed.
//! It unifies the two timespan lifecycles:
//!
//! - *Manual*: created unfinished at start time; a later `finish` records
//!   the end. An unfinished row left behind by a crash is detected through
//!   the staleness policy, governed by the `can_be_stale` flag carried
//!   here (never persisted).
//! - *Periodic*: created with both endpoints known; the row is finished at
//!   insert time and no unfinished state is ever observable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, EventId};

/// In-memory descriptor for one timespan event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// The logical activity this event belongs to.
    pub activity: ActivityId,
    /// Caller-chosen event ID, unique within the caller's activity namespace.
    pub id: EventId,
    /// Whether an unfinished row for this event may be classified stale.
    pub can_be_stale: bool,
    /// Whether this is a periodic (pre-closed) event.
    pub is_periodic: bool,
    /// When the event started.
    pub started_at: DateTime<Utc>,
    /// When the event ended, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Row ID assigned once the event is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    /// Opaque caller-owned payload stored alongside the row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl EventDescriptor {
    /// Creates a descriptor for a manually tracked event.
    ///
    /// The event starts unfinished; `ended_at` and `database_id` are filled
    /// in by the store.
    #[must_use]
    pub const fn manual(
        activity: ActivityId,
        id: EventId,
        can_be_stale: bool,
        started_at: DateTime<Utc>,
        extra: Option<String>,
    ) -> Self {
        Self {
            activity,
            id,
            can_be_stale,
            is_periodic: false,
            started_at,
            ended_at: None,
            database_id: None,
            extra,
        }
    }

    /// Creates a descriptor for a periodic event whose duration was
    /// computed after the fact.
    #[must_use]
    pub const fn periodic(
        activity: ActivityId,
        id: EventId,
        can_be_stale: bool,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        extra: Option<String>,
    ) -> Self {
        Self {
            activity,
            id,
            can_be_stale,
            is_periodic: true,
            started_at,
            ended_at: Some(ended_at),
            database_id: None,
            extra,
        }
    }

    /// Derives the stable in-memory lookup key for this event.
    ///
    /// The key combines activity identity and the caller's event ID. It is
    /// used only for deduplication and lookup before the database ID is
    /// known; it is never persisted, and callers must keep their event IDs
    /// unique within their own activity namespace.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}#{}", self.activity, self.id)
    }

    /// Whether the event has an end recorded.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Classifies an unfinished event against a staleness threshold.
///
/// An unfinished event is stale iff it was created with `can_be_stale`
/// set and started before `threshold`. Events without the flag are never
/// stale regardless of age; the store performs no automatic cleanup either
/// way.
#[must_use]
pub fn is_stale(
    started_at: DateTime<Utc>,
    can_be_stale: bool,
    threshold: DateTime<Utc>,
) -> bool {
    can_be_stale && started_at < threshold
}
