//! Totals command for per-app usage on one day.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use uc_db::{DailyTotal, Database};

use crate::commands::util::format_duration;

/// Widest app column before names get truncated.
const APP_WIDTH: usize = 40;

// ========== Human-Readable Output ==========

/// Formats totals as a table, largest first.
pub fn format_totals(day: NaiveDate, totals: &[DailyTotal]) -> String {
    let mut output = String::new();

    if totals.is_empty() {
        writeln!(output, "No usage recorded for {day}.").unwrap();
        return output;
    }

    writeln!(output, "Usage for {day}").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "{:<APP_WIDTH$}  {:>8}", "App", "Time").unwrap();
    writeln!(output, "{}  {}", "─".repeat(APP_WIDTH), "─".repeat(8)).unwrap();

    for row in totals {
        let name = row.app.as_str();
        // Truncate by characters, not bytes
        let name = if name.chars().count() > APP_WIDTH {
            format!("{}...", name.chars().take(APP_WIDTH - 3).collect::<String>())
        } else {
            name.to_string()
        };
        writeln!(
            output,
            "{name:<APP_WIDTH$}  {:>8}",
            format_duration(row.duration_ms)
        )
        .unwrap();
    }

    let total: i64 = totals.iter().map(|row| row.duration_ms).sum();
    writeln!(output, "{}  {}", "─".repeat(APP_WIDTH), "─".repeat(8)).unwrap();
    writeln!(output, "{:<APP_WIDTH$}  {:>8}", "Total", format_duration(total)).unwrap();

    output
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub day: String,
    pub total_ms: i64,
    pub apps: Vec<JsonAppTotal>,
}

#[derive(Debug, Serialize)]
pub struct JsonAppTotal {
    pub app: String,
    pub duration_ms: i64,
}

/// Formats totals as JSON.
pub fn format_totals_json(day: NaiveDate, totals: &[DailyTotal]) -> Result<String> {
    let json = JsonTotals {
        day: day.format("%Y-%m-%d").to_string(),
        total_ms: totals.iter().map(|row| row.duration_ms).sum(),
        apps: totals
            .iter()
            .map(|row| JsonAppTotal {
                app: row.app.to_string(),
                duration_ms: row.duration_ms,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

pub fn run(db: &Database, day: NaiveDate, json: bool) -> Result<()> {
    let totals = db.daily_totals(day)?;

    if json {
        println!("{}", format_totals_json(day, &totals)?);
    } else {
        print!("{}", format_totals(day, &totals));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use uc_core::AppId;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn total(app: &str, duration_ms: i64) -> DailyTotal {
        DailyTotal {
            day: day(),
            app: AppId::new(app).unwrap(),
            duration_ms,
        }
    }

    #[test]
    fn empty_day() {
        assert_eq!(format_totals(day(), &[]), "No usage recorded for 2025-01-01.\n");
    }

    #[test]
    fn table_output() {
        let totals = [
            total("com.example.reader", 3_720_000),
            total("com.example.chat", 2_700_000),
            total("com.example.clock", 45_000),
        ];

        assert_snapshot!(format_totals(day(), &totals), @r"
        Usage for 2025-01-01

        App                                           Time
        ────────────────────────────────────────  ────────
        com.example.reader                           1h 2m
        com.example.chat                               45m
        com.example.clock                              45s
        ────────────────────────────────────────  ────────
        Total                                       1h 47m
        ");
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "com.example.".to_string() + &"x".repeat(40);
        let output = format_totals(day(), &[total(&long, 1_000)]);
        let row = output.lines().nth(4).unwrap();
        assert!(row.starts_with(&format!("com.example.{}...", "x".repeat(25))));
    }

    #[test]
    fn json_output() {
        let totals = [total("com.a", 90_000), total("com.b", 10_000)];

        assert_snapshot!(format_totals_json(day(), &totals).unwrap(), @r#"
        {
          "day": "2025-01-01",
          "total_ms": 100000,
          "apps": [
            {
              "app": "com.a",
              "duration_ms": 90000
            },
            {
              "app": "com.b",
              "duration_ms": 10000
            }
          ]
        }
        "#);
    }
}
