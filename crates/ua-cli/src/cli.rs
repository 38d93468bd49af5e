//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Local user-activity database.
///
/// Records counter deltas and timespan events from IDE hooks into an
/// embedded SQLite store and answers windowed aggregation queries.
#[derive(Debug, Parser)]
#[command(name = "ua", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Establish machine identity and register this IDE installation.
    Init {
        /// Human-friendly machine label (defaults to the hostname).
        #[arg(long)]
        label: Option<String>,
    },

    /// Append a signed delta to a counter activity.
    Submit {
        /// Logical counter name (e.g., completion.accepted).
        #[arg(long)]
        activity: String,

        /// Signed delta to record.
        #[arg(long)]
        diff: i64,

        /// Timestamp of the delta, RFC 3339 (defaults to now).
        #[arg(long)]
        at: Option<String>,

        /// Opaque payload stored alongside the row.
        #[arg(long)]
        extra: Option<String>,
    },

    /// Sum counter deltas over a time window.
    Sum {
        /// Logical counter name.
        #[arg(long)]
        activity: String,

        /// Window start, RFC 3339, inclusive (defaults to the epoch).
        #[arg(long)]
        from: Option<String>,

        /// Window end, RFC 3339, exclusive (defaults to now).
        #[arg(long)]
        to: Option<String>,

        /// Emit JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Open a manual timespan event; prints the row ID for `finish`.
    Start {
        /// Logical activity name.
        #[arg(long)]
        activity: String,

        /// Caller-chosen event ID, unique within the activity.
        #[arg(long)]
        event: String,

        /// Allow an abandoned row to be classified stale by readers.
        #[arg(long)]
        can_be_stale: bool,

        /// Start timestamp, RFC 3339 (defaults to now).
        #[arg(long)]
        at: Option<String>,

        /// Opaque payload stored alongside the row.
        #[arg(long)]
        extra: Option<String>,
    },

    /// Finish a previously started timespan event.
    Finish {
        /// Row ID printed by `start`.
        #[arg(long)]
        row: i64,

        /// End timestamp, RFC 3339 (defaults to now).
        #[arg(long)]
        at: Option<String>,
    },

    /// Record a pre-closed timespan event in one shot.
    Periodic {
        /// Logical activity name.
        #[arg(long)]
        activity: String,

        /// Caller-chosen event ID, unique within the activity.
        #[arg(long)]
        event: String,

        /// Interval start, RFC 3339.
        #[arg(long)]
        from: String,

        /// Interval end, RFC 3339.
        #[arg(long)]
        to: String,

        /// Opaque payload stored alongside the row.
        #[arg(long)]
        extra: Option<String>,
    },

    /// List unfinished timespan rows older than a threshold.
    Stale {
        /// Logical activity name.
        #[arg(long)]
        activity: String,

        /// Staleness threshold, RFC 3339: rows started before it are stale.
        #[arg(long)]
        threshold: String,
    },

    /// Show recent activity per counter and timespan.
    Status,
}
