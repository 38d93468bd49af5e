//! Sum command: windowed counter aggregation.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use ua_core::{ActivityId, format_timestamp};
use ua_db::Database;

use crate::commands::util;

#[derive(Debug, Serialize)]
struct SumReport<'a> {
    activity: &'a str,
    from: String,
    to: String,
    sum: i64,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    activity: &str,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let from = from.map_or_else(|| Ok(DateTime::<Utc>::UNIX_EPOCH), util::parse_arg_timestamp)?;
    let to = util::parse_arg_timestamp_or_now(to)?;

    let sum = db.activity_sum(&activity, from, to)?;

    if json {
        let report = SumReport {
            activity: activity.as_str(),
            from: format_timestamp(from),
            to: format_timestamp(to),
            sum,
        };
        writeln!(writer, "{}", serde_json::to_string(&report)?)?;
    } else {
        writeln!(writer, "{sum}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use ua_core::{IdeFamily, IdeInfo, parse_timestamp};

    use super::*;

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let ide = IdeInfo::new("machine-1", "ide-1", IdeFamily::Desktop).unwrap();
        let ide_row = db.register_ide(&ide).unwrap();
        let usage = ActivityId::new("ide.usage").unwrap();
        db.submit_direct(
            ide_row,
            &usage,
            13,
            parse_timestamp("2025-01-01T10:00:00Z").unwrap(),
            None,
        )
        .unwrap();
        db.submit_direct(
            ide_row,
            &usage,
            1989,
            parse_timestamp("2025-01-01T11:00:00Z").unwrap(),
            None,
        )
        .unwrap();
        db
    }

    #[test]
    fn plain_output_is_just_the_sum() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            "ide.usage",
            None,
            Some("2026-01-01T00:00:00Z"),
            false,
        )
        .unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"2002");
    }

    #[test]
    fn json_output_carries_the_window() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            "ide.usage",
            Some("2025-01-01T00:00:00Z"),
            Some("2025-01-01T10:30:00Z"),
            true,
        )
        .unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @r#"{"activity":"ide.usage","from":"2025-01-01T00:00:00.000Z","to":"2025-01-01T10:30:00.000Z","sum":13}"#
        );
    }

    #[test]
    fn unknown_activity_sums_to_zero() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            "never.seen",
            None,
            Some("2026-01-01T00:00:00Z"),
            false,
        )
        .unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), "0");
    }
}
