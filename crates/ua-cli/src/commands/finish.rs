//! Finish command: close a manual timespan event by row ID.

use anyhow::Result;

use ua_db::Database;

use crate::commands::util;

pub fn run(db: &mut Database, row: i64, at: Option<&str>) -> Result<()> {
    let end_at = util::parse_arg_timestamp_or_now(at)?;
    db.finish_by_id(row, end_at)?;
    tracing::debug!(row, "finished timespan event");
    Ok(())
}
