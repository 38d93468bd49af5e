//! Stale command: list abandoned timespan rows.
//!
//! The `can_be_stale` flag lives on the in-memory descriptor, not in the
//! row, so this reader treats every unfinished row as eligible and filters
//! by the threshold alone. Callers that opened events without the flag
//! should ignore their own rows in the output.

use std::io::Write;

use anyhow::{Context, Result};

use ua_core::ActivityId;
use ua_db::Database;

use crate::commands::util;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    activity: &str,
    threshold: &str,
) -> Result<()> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let threshold = util::parse_arg_timestamp(threshold)?;

    let stale = db.stale_events(&activity, threshold)?;
    tracing::debug!(%activity, stale = stale.len(), "classified unfinished rows");
    for record in stale {
        writeln!(writer, "{}\t{}", record.id, record.started_at)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use ua_core::{EventDescriptor, EventId, IdeFamily, IdeInfo, parse_timestamp};

    use super::*;

    #[test]
    fn lists_only_rows_older_than_threshold() {
        let mut db = Database::open_in_memory().unwrap();
        let ide = IdeInfo::new("m", "i", IdeFamily::Desktop).unwrap();
        let ide_row = db.register_ide(&ide).unwrap();

        let t0 = parse_timestamp("2025-01-01T09:00:00Z").unwrap();
        let mut abandoned = EventDescriptor::manual(
            ActivityId::new("ide.session").unwrap(),
            EventId::new("old").unwrap(),
            true,
            t0,
            None,
        );
        db.start_manual(ide_row, &mut abandoned).unwrap();

        let mut recent = EventDescriptor::manual(
            ActivityId::new("ide.session").unwrap(),
            EventId::new("new").unwrap(),
            true,
            t0 + Duration::hours(2),
            None,
        );
        db.start_manual(ide_row, &mut recent).unwrap();

        // Reader at t0 + 2h applying a one-hour threshold.
        let mut output = Vec::new();
        run(&mut output, &db, "ide.session", "2025-01-01T10:00:00Z").unwrap();
        let output = String::from_utf8(output).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(&abandoned.database_id.unwrap().to_string()));
    }

    #[test]
    fn finished_rows_are_never_stale() {
        let mut db = Database::open_in_memory().unwrap();
        let ide = IdeInfo::new("m", "i", IdeFamily::Desktop).unwrap();
        let ide_row = db.register_ide(&ide).unwrap();

        let t0 = parse_timestamp("2025-01-01T09:00:00Z").unwrap();
        let mut descriptor = EventDescriptor::manual(
            ActivityId::new("ide.session").unwrap(),
            EventId::new("done").unwrap(),
            true,
            t0,
            None,
        );
        db.start_manual(ide_row, &mut descriptor).unwrap();
        db.finish(&mut descriptor, t0 + Duration::minutes(5)).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, "ide.session", "2026-01-01T00:00:00Z").unwrap();
        assert!(output.is_empty());
    }
}
