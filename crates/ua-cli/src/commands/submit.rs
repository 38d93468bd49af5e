//! Submit command: append one counter delta.

use anyhow::{Context, Result};

use ua_core::ActivityId;
use ua_db::Database;

use crate::Config;
use crate::commands::util;

pub fn run(
    db: &mut Database,
    config: &Config,
    activity: &str,
    diff: i64,
    at: Option<&str>,
    extra: Option<&str>,
) -> Result<()> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let at = util::parse_arg_timestamp_or_now(at)?;
    let ide_row = util::resolve_ide_row(db, config)?;

    let row = db.submit_direct(ide_row, &activity, diff, at, extra)?;
    tracing::debug!(row, %activity, diff, "recorded counter delta");
    println!("{row}");
    Ok(())
}
