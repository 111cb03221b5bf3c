//! CLI subcommand implementations.

pub mod collect;
pub mod import;
pub mod intervals;
pub mod status;
pub mod totals;
pub mod util;
