//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Device usage collector.
///
/// Turns buffered screen and app events into per-day, per-app usage totals
/// and an interval log.
#[derive(Debug, Parser)]
#[command(name = "uc", version, about, long_about = None)]
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
    /// Import usage events as JSON lines from stdin.
    Import,

    /// Run one collection pass over events up to now.
    Collect {
        /// End of the window (ISO 8601 or e.g. "5 minutes ago"). Defaults to now.
        #[arg(long)]
        now: Option<String>,

        /// Delete buffered events behind the new watermark.
        #[arg(long)]
        prune: bool,
    },

    /// Show collector state.
    Status,

    /// Show per-app totals for a day.
    Totals {
        /// Day to show (YYYY-MM-DD). Defaults to today in the reference zone.
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the interval log for a day.
    Intervals {
        /// Day to show (YYYY-MM-DD). Defaults to today in the reference zone.
        #[arg(long)]
        day: Option<NaiveDate>,
    },
}
