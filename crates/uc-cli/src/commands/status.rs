//! Status command for showing the collector state.

use std::io::Write;

use anyhow::Result;

use uc_core::Foreground;
use uc_db::Database;

use crate::Config;
use crate::commands::util::format_timestamp;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let zone = config.zone()?;

    writeln!(writer, "Usage collector status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Timezone: {}", zone.name())?;
    writeln!(writer, "Buffered events: {}", db.event_count()?)?;

    let days = db.recorded_days()?;
    match (days.first(), days.last()) {
        (Some(first), Some(last)) if first == last => {
            writeln!(writer, "Recorded days: 1 ({first})")?;
        }
        (Some(first), Some(last)) => {
            writeln!(writer, "Recorded days: {} ({first} to {last})", days.len())?;
        }
        _ => writeln!(writer, "Recorded days: none")?,
    }

    let Some(state) = db.load_state()? else {
        writeln!(writer, "No collection pass yet.")?;
        return Ok(());
    };

    writeln!(
        writer,
        "Processed up to: {}",
        format_timestamp(&zone, state.last_processed_ms)
    )?;
    let screen = if state.screen_interactive {
        "interactive"
    } else {
        "non-interactive"
    };
    writeln!(writer, "Screen: {screen}")?;
    match &state.foreground {
        Foreground::Empty => writeln!(writer, "Foreground: none")?,
        Foreground::Parked { app } => writeln!(writer, "Foreground: {app} (paused)")?,
        Foreground::Open { app, start_ms } => writeln!(
            writer,
            "Foreground: {app} (since {})",
            format_timestamp(&zone, *start_ms)
        )?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use uc_core::{AggregatorConfig, AppId, SessionAggregator, SessionState, UsageEvent};

    fn config(db_path: &std::path::Path) -> Config {
        Config {
            database_path: db_path.to_path_buf(),
            timezone: Some("Europe/Bratislava".to_string()),
            min_segment_ms: 1_000,
            first_run_lookback_ms: 20 * 60 * 1000,
            initial_screen_interactive: true,
        }
    }

    fn render(db: &Database, config: &Config) -> String {
        let mut output = Vec::new();
        run(&mut output, db, config).unwrap();
        let output = String::from_utf8(output).unwrap();
        output.replace(&config.database_path.display().to_string(), "[TEMP]/uc.db")
    }

    #[test]
    fn status_before_first_pass() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("uc.db");
        let db = Database::open(&db_path).unwrap();

        assert_snapshot!(render(&db, &config(&db_path)), @r"
        Usage collector status
        Database: [TEMP]/uc.db
        Timezone: Europe/Bratislava
        Buffered events: 0
        Recorded days: none
        No collection pass yet.
        ");
    }

    #[test]
    fn status_shows_open_segment() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("uc.db");
        let mut db = Database::open(&db_path).unwrap();
        let app = AppId::new("com.example.reader").unwrap();
        // 2025-01-01T09:00:00Z
        let start = 1_735_722_000_000;
        let events = [UsageEvent::foreground(start, app)];
        db.insert_events(&events).unwrap();

        let aggregator = SessionAggregator::new(chrono::Utc, AggregatorConfig::default());
        db.apply_batch(
            &aggregator,
            &SessionState::first_run(start, true),
            &events,
            start + 600_000,
        )
        .unwrap();

        assert_snapshot!(render(&db, &config(&db_path)), @r"
        Usage collector status
        Database: [TEMP]/uc.db
        Timezone: Europe/Bratislava
        Buffered events: 1
        Recorded days: 1 (2025-01-01)
        Processed up to: 2025-01-01T10:10:00+01:00
        Screen: interactive
        Foreground: com.example.reader (since 2025-01-01T10:10:00+01:00)
        ");
    }
}
