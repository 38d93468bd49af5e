//! Start command: open a manual timespan event.

use anyhow::{Context, Result};

use ua_core::{ActivityId, EventDescriptor, EventId};
use ua_db::Database;

use crate::Config;
use crate::commands::util;

pub fn run(
    db: &mut Database,
    config: &Config,
    activity: &str,
    event: &str,
    can_be_stale: bool,
    at: Option<&str>,
    extra: Option<&str>,
) -> Result<()> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let event = EventId::new(event).context("invalid event ID")?;
    let started_at = util::parse_arg_timestamp_or_now(at)?;
    let ide_row = util::resolve_ide_row(db, config)?;

    let mut descriptor = EventDescriptor::manual(
        activity,
        event,
        can_be_stale,
        started_at,
        extra.map(str::to_string),
    );
    db.start_manual(ide_row, &mut descriptor)?;

    let row = descriptor
        .database_id
        .context("store did not assign a row ID")?;
    tracing::debug!(row, key = %descriptor.key(), "opened timespan event");
    println!("{row}");
    Ok(())
}
