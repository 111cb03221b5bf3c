//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as either ISO 8601 or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    parse_datetime_from(s, Utc::now())
}

/// Like [`parse_datetime`], with relative times counted back from `now`.
pub fn parse_datetime_from(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    // Try ISO 8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    let duration = Duration::minutes(n * minutes_per_unit);
    Ok(now - duration)
}

/// Formats milliseconds as a short duration string.
///
/// "Xh Ym" from one hour, "Xm" from one minute, "Xs" below that.
/// Negative durations are treated as 0s.
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0s".to_string();
    }
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m")
    } else {
        format!("{total_seconds}s")
    }
}

/// Formats epoch milliseconds as RFC 3339 in `zone`.
pub fn format_timestamp<Z: TimeZone>(zone: &Z, ms: i64) -> String
where
    Z::Offset: std::fmt::Display,
{
    DateTime::from_timestamp_millis(ms).map_or_else(
        || format!("{ms} ms"),
        |utc| {
            utc.with_timezone(zone)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        },
    )
}

/// Formats the local wall-clock time of epoch milliseconds in `zone`.
pub fn format_clock<Z: TimeZone>(zone: &Z, ms: i64) -> String
where
    Z::Offset: std::fmt::Display,
{
    DateTime::from_timestamp_millis(ms).map_or_else(
        || format!("{ms} ms"),
        |utc| utc.with_timezone(zone).format("%H:%M:%S").to_string(),
    )
}

/// Today's date in `zone`.
pub fn today_in<Z: TimeZone>(zone: &Z) -> NaiveDate {
    Utc::now().with_timezone(zone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_datetime_from("2025-01-29T13:00:00+01:00", now()).unwrap();
        assert_eq!(parsed, now());
    }

    #[test]
    fn parses_relative_times() {
        assert_eq!(
            parse_datetime_from("30 minutes ago", now()).unwrap(),
            now() - Duration::minutes(30)
        );
        assert_eq!(
            parse_datetime_from("1 day ago", now()).unwrap(),
            now() - Duration::days(1)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime_from("yesterday-ish", now()).is_err());
        assert!(parse_datetime_from("99999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(-5), "0s");
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(2_700_000), "45m");
        assert_eq!(format_duration(3_720_000), "1h 2m");
    }

    #[test]
    fn formats_timestamps_in_zone() {
        let zone = chrono_tz::Europe::Bratislava;
        let ms = now().timestamp_millis();
        assert_eq!(format_timestamp(&zone, ms), "2025-01-29T13:00:00+01:00");
        assert_eq!(format_timestamp(&Utc, ms), "2025-01-29T12:00:00Z");
        assert_eq!(format_clock(&zone, ms), "13:00:00");
        assert_eq!(format_timestamp(&Utc, i64::MAX), format!("{} ms", i64::MAX));
    }
}
