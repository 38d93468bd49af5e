//! User-activity database CLI library.
//!
//! This crate provides the CLI interface for the local activity store.

mod cli;
pub mod commands;
mod config;
pub mod machine;

pub use cli::{Cli, Commands};
pub use config::Config;
