//! Shared helpers for subcommands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use ua_core::{IdeFamily, IdeInfo};
use ua_db::Database;

use crate::Config;
use crate::machine;

/// Resolves the IDE row for this (machine, installation, family).
///
/// Requires machine identity; the row is inserted on first use.
pub fn resolve_ide_row(db: &mut Database, config: &Config) -> Result<i64> {
    let identity = machine::require_machine_identity()?;
    let family: IdeFamily = config
        .family
        .parse()
        .with_context(|| format!("invalid family {:?} in configuration", config.family))?;
    let ide = IdeInfo::new(identity.machine_id, config.ide_id.clone(), family)
        .context("invalid installation identity")?;
    let ide_row = db.register_ide(&ide)?;
    Ok(ide_row)
}

/// Parses an RFC 3339 timestamp argument.
pub fn parse_arg_timestamp(value: &str) -> Result<DateTime<Utc>> {
    ua_core::parse_timestamp(value)
        .with_context(|| format!("expected an RFC 3339 timestamp, got {value:?}"))
}

/// Parses an optional timestamp argument, defaulting to now.
pub fn parse_arg_timestamp_or_now(value: Option<&str>) -> Result<DateTime<Utc>> {
    value.map_or_else(|| Ok(Utc::now()), parse_arg_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_arg_timestamp_accepts_rfc3339() {
        let parsed = parse_arg_timestamp("2025-01-01T09:30:00Z").unwrap();
        assert_eq!(parsed.timestamp(), 1_735_723_800);
    }

    #[test]
    fn parse_arg_timestamp_rejects_dates_without_time() {
        assert!(parse_arg_timestamp("2025-01-01").is_err());
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let parsed = parse_arg_timestamp_or_now(None).unwrap();
        assert!(parsed >= before);
    }
}
