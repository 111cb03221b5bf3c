//! Intervals command for the per-day interval log.

use std::fmt::{Display, Write};

use anyhow::Result;
use chrono::{NaiveDate, TimeZone};

use uc_core::UsageSegment;
use uc_db::Database;

use crate::Config;
use crate::commands::util::{format_clock, format_duration};

/// Formats the interval log of one day with local wall-clock times.
pub fn format_intervals<Z: TimeZone>(zone: &Z, day: NaiveDate, segments: &[UsageSegment]) -> String
where
    Z::Offset: Display,
{
    let mut output = String::new();

    if segments.is_empty() {
        writeln!(output, "No intervals recorded for {day}.").unwrap();
        return output;
    }

    writeln!(output, "Intervals for {day}").unwrap();
    for segment in segments {
        writeln!(
            output,
            "{} - {}  {:>7}  {}",
            format_clock(zone, segment.start_ms),
            format_clock(zone, segment.end_ms),
            format_duration(segment.duration_ms()),
            segment.app
        )
        .unwrap();
    }

    output
}

pub fn run(db: &Database, config: &Config, day: NaiveDate) -> Result<()> {
    let zone = config.zone()?;
    let segments = db.intervals_for_day(day)?;
    print!("{}", format_intervals(&zone, day, &segments));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use uc_core::AppId;

    fn segment(app: &str, start_ms: i64, end_ms: i64) -> UsageSegment {
        UsageSegment {
            day: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            app: AppId::new(app).unwrap(),
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn lists_segments_in_local_time() {
        let zone = chrono_tz::Europe::Bratislava;
        // 2025-01-01T09:00:00Z
        let base = 1_735_722_000_000;
        let segments = [
            segment("com.a", base, base + 90_000),
            segment("com.b", base + 90_000, base + 3_690_000),
        ];

        assert_snapshot!(format_intervals(&zone, segments[0].day, &segments), @r"
        Intervals for 2025-01-01
        10:00:00 - 10:01:30       1m  com.a
        10:01:30 - 11:01:30    1h 0m  com.b
        ");
    }

    #[test]
    fn empty_day() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            format_intervals(&chrono::Utc, day, &[]),
            "No intervals recorded for 2025-01-01.\n"
        );
    }
}
