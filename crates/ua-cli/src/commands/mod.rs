//! CLI subcommand implementations.

pub mod finish;
pub mod init;
pub mod periodic;
pub mod stale;
pub mod start;
pub mod status;
pub mod submit;
pub mod sum;
pub(crate) mod util;
