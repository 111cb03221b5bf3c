use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use uc_cli::commands::util::{parse_datetime, today_in};
use uc_cli::commands::{collect, import, intervals, status, totals};
use uc_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(uc_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = uc_db::Database::open(&config.database_path).context("failed to open database")?;
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
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Import) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let stdin = std::io::stdin();
            let summary = import::run(stdin.lock(), &mut db)?;
            eprintln!(
                "Imported {} new event(s) ({} total)",
                summary.inserted, summary.parsed
            );
        }
        Some(Commands::Collect { now, prune }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let now = match now {
                Some(value) => parse_datetime(value)?,
                None => Utc::now(),
            };
            let summary = collect::run(&mut db, &config, now, *prune)?;
            println!("{}", collect::format_summary(&summary, &config)?);
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut std::io::stdout().lock(), &db, &config)?;
        }
        Some(Commands::Totals { day, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let day = match day {
                Some(day) => *day,
                None => today_in(&config.zone()?),
            };
            totals::run(&db, day, *json)?;
        }
        Some(Commands::Intervals { day }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let day = match day {
                Some(day) => *day,
                None => today_in(&config.zone()?),
            };
            intervals::run(&db, &config, day)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
