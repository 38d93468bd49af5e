//! Status command for showing recent activity per store.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use ua_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let activities = db.activity_overview()?;

    writeln!(writer, "User-activity database status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Schema version: {}", db.schema_version()?)?;

    if activities.is_empty() {
        writeln!(writer, "No activity recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Activities:")?;
    for activity in activities {
        writeln!(
            writer,
            "- {} ({}): {}",
            activity.activity_id, activity.kind, activity.last_seen
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use ua_core::{ActivityId, IdeFamily, IdeInfo, parse_timestamp};

    use super::*;

    #[test]
    fn status_lists_latest_write_per_activity() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ua.db");
        let mut db = Database::open(&db_path).unwrap();

        let ide = IdeInfo::new("machine-1", "ide-1", IdeFamily::Desktop).unwrap();
        let ide_row = db.register_ide(&ide).unwrap();
        db.submit_direct(
            ide_row,
            &ActivityId::new("ide.usage").unwrap(),
            5,
            parse_timestamp("2025-01-01T10:00:00Z").unwrap(),
            None,
        )
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/ua.db");
        assert_snapshot!(output, @r"
        User-activity database status
        Database: [TEMP]/ua.db
        Schema version: 2
        Activities:
        - ide.usage (counter): 2025-01-01T10:00:00.000Z
        ");
    }

    #[test]
    fn empty_store_reports_no_activity() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("/tmp/ua.db")).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("No activity recorded."));
    }
}
