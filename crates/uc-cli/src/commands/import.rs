//! Import command for buffering usage events in the local `SQLite` store.
//!
//! Reads one JSON object per line:
//!
//! ```text
//! {"timestamp_ms": 1735689600000, "type": "app_foreground", "app": "com.example"}
//! {"timestamp": "2025-01-01T00:00:05Z", "type": "screen_non_interactive"}
//! ```

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;

use uc_core::{AppId, EventType, UsageEvent};
use uc_db::Database;

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Lines parsed into events.
    pub parsed: usize,
    /// Events that were not already buffered.
    pub inserted: usize,
}

pub fn run<R: BufRead>(reader: R, db: &mut Database) -> Result<ImportSummary> {
    let events = parse_events(reader)?;
    let inserted = db
        .insert_events(&events)
        .context("failed to store events")?;
    Ok(ImportSummary {
        parsed: events.len(),
        inserted,
    })
}

fn parse_events<R: BufRead>(reader: R) -> Result<Vec<UsageEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let event = parsed
            .into_event()
            .with_context(|| format!("invalid event on line {}", idx + 1))?;
        events.push(event);
    }
    Ok(events)
}

#[derive(Debug, Deserialize)]
struct ImportEvent {
    #[serde(default)]
    timestamp_ms: Option<i64>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "type")]
    kind: EventType,
    #[serde(default)]
    app: Option<String>,
}

impl ImportEvent {
    fn into_event(self) -> Result<UsageEvent> {
        let timestamp_ms = match (self.timestamp_ms, self.timestamp) {
            (Some(ms), _) => ms,
            (None, Some(ts)) => DateTime::parse_from_rfc3339(&ts)
                .with_context(|| format!("invalid timestamp: {ts}"))?
                .timestamp_millis(),
            (None, None) => anyhow::bail!("missing timestamp_ms or timestamp"),
        };
        let app = self.app.map(AppId::new).transpose()?;
        Ok(UsageEvent::from_parts(timestamp_ms, self.kind, app)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str) -> AppId {
        AppId::new(id).unwrap()
    }

    #[test]
    fn parses_both_timestamp_forms_and_aliases() {
        let input = r#"{"timestamp_ms": 1000, "type": "activity_resumed", "app": "com.a"}

{"timestamp": "1970-01-01T00:00:02Z", "type": "screen_non_interactive"}
"#;
        let events = parse_events(input.as_bytes()).unwrap();

        assert_eq!(
            events,
            vec![
                UsageEvent::foreground(1_000, app("com.a")),
                UsageEvent::screen_non_interactive(2_000),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_event() {
        let input = r#"{"timestamp_ms": 1000, "type": "screen_interactive"}
{"timestamp_ms": 2000, "type": "app_background"}
"#;
        let err = parse_events(input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "invalid event on line 2");
    }

    #[test]
    fn rejects_unknown_type() {
        let input = r#"{"timestamp_ms": 1000, "type": "keyguard_hidden"}"#;
        let err = parse_events(input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "invalid JSON on line 1");
    }

    #[test]
    fn rejects_missing_timestamp() {
        let input = r#"{"type": "screen_interactive"}"#;
        assert!(parse_events(input.as_bytes()).is_err());
    }

    #[test]
    fn reimport_inserts_nothing() {
        let input = r#"{"timestamp_ms": 1000, "type": "app_foreground", "app": "com.a"}
{"timestamp_ms": 2000, "type": "app_background", "app": "com.a"}
"#;
        let mut db = Database::open_in_memory().unwrap();

        let first = run(input.as_bytes(), &mut db).unwrap();
        let second = run(input.as_bytes(), &mut db).unwrap();

        assert_eq!(
            first,
            ImportSummary {
                parsed: 2,
                inserted: 2
            }
        );
        assert_eq!(
            second,
            ImportSummary {
                parsed: 2,
                inserted: 0
            }
        );
    }
}
