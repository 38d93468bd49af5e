//! Periodic command: record a pre-closed timespan event.

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
    from: &str,
    to: &str,
    extra: Option<&str>,
) -> Result<()> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let event = EventId::new(event).context("invalid event ID")?;
    let started_at = util::parse_arg_timestamp(from)?;
    let ended_at = util::parse_arg_timestamp(to)?;
    let ide_row = util::resolve_ide_row(db, config)?;

    let mut descriptor = EventDescriptor::periodic(
        activity,
        event,
        false,
        started_at,
        ended_at,
        extra.map(str::to_string),
    );
    db.submit_periodic(ide_row, &mut descriptor)?;

    let row = descriptor
        .database_id
        .context("store did not assign a row ID")?;
    tracing::debug!(row, key = %descriptor.key(), "recorded periodic event");
    println!("{row}");
    Ok(())
}
