//! Core domain types for the user-activity database.
//!
//! This crate contains the fundamental types for:
//! - Activity identity: validated IDs for counters and timespan events
//! - Event descriptors: the in-memory handle unifying manual and periodic
//!   timespan lifecycles
//! - IDE installation identity: the (machine, installation, family) triple
//!   that namespaces all recorded activity

pub mod descriptor;
pub mod ide;
pub mod time;
pub mod types;

pub use descriptor::{EventDescriptor, is_stale};
pub use ide::{IdeFamily, IdeInfo};
pub use time::{format_timestamp, parse_timestamp, TimestampParseError};
pub use types::{ActivityId, EventId, ValidationError};
