use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ua_cli::commands::{finish, init, periodic, stale, start, status, submit, sum};
use ua_cli::{Cli, Commands, Config};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ua_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ua_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Init { label }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            init::run(&mut db, &config, label.as_deref())?;
        }
        Some(Commands::Submit {
            activity,
            diff,
            at,
            extra,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            submit::run(
                &mut db,
                &config,
                activity,
                *diff,
                at.as_deref(),
                extra.as_deref(),
            )?;
        }
        Some(Commands::Sum {
            activity,
            from,
            to,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            sum::run(
                &mut stdout,
                &db,
                activity,
                from.as_deref(),
                to.as_deref(),
                *json,
            )?;
        }
        Some(Commands::Start {
            activity,
            event,
            can_be_stale,
            at,
            extra,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            start::run(
                &mut db,
                &config,
                activity,
                event,
                *can_be_stale,
                at.as_deref(),
                extra.as_deref(),
            )?;
        }
        Some(Commands::Finish { row, at }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            finish::run(&mut db, *row, at.as_deref())?;
        }
        Some(Commands::Periodic {
            activity,
            event,
            from,
            to,
            extra,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            periodic::run(
                &mut db,
                &config,
                activity,
                event,
                from,
                to,
                extra.as_deref(),
            )?;
        }
        Some(Commands::Stale {
            activity,
            threshold,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            stale::run(&mut stdout, &db, activity, threshold)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut stdout, &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            stdout.flush()?;
            println!();
        }
    }

    Ok(())
}
