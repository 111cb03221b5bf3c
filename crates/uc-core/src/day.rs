//! Calendar-day bucketing in a fixed reference zone.
//!
//! Spans are cut at local midnight. When a transition removes midnight the
//! day starts at the first instant whose local date is that day, and when
//! midnight repeats the first occurrence after the cursor is used. A date
//! the zone skipped entirely gets no span.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// Coarse step used to search past a gap that swallows local midnight.
const GAP_PROBE_MINUTES: i64 = 15;

/// Consecutive dates a zone may skip entirely (Pacific/Apia lost 2011-12-30).
const MAX_SKIPPED_DAYS: usize = 2;

/// A piece of a span that lies within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpan {
    pub day: NaiveDate,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DaySpan {
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// Returns the calendar day of `ms` in `zone`.
///
/// `None` if the timestamp is outside chrono's representable range.
pub fn local_day<Z: TimeZone>(zone: &Z, ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|utc| utc.with_timezone(zone).date_naive())
}

/// Returns the exclusive upper bound of `day`: the start of the next day in epoch ms.
pub fn day_end_ms<Z: TimeZone>(zone: &Z, day: NaiveDate) -> Option<i64> {
    next_day_start(zone, day)
        .earliest()
        .map(|instant| instant.timestamp_millis())
}

/// Splits `[start_ms, end_ms)` into per-day spans.
///
/// Spans are contiguous and their durations sum to `end_ms - start_ms`.
/// An empty or inverted input yields nothing.
pub const fn split_by_day<Z: TimeZone>(zone: &Z, start_ms: i64, end_ms: i64) -> DaySplit<'_, Z> {
    DaySplit {
        zone,
        cursor: start_ms,
        end_ms,
    }
}

/// Iterator returned by [`split_by_day`].
#[derive(Debug)]
pub struct DaySplit<'z, Z: TimeZone> {
    zone: &'z Z,
    cursor: i64,
    end_ms: i64,
}

impl<Z: TimeZone> Iterator for DaySplit<'_, Z> {
    type Item = DaySpan;

    fn next(&mut self) -> Option<DaySpan> {
        if self.cursor >= self.end_ms {
            return None;
        }
        let start_ms = self.cursor;
        let Some(day) = local_day(self.zone, start_ms) else {
            self.cursor = self.end_ms;
            return None;
        };
        let end_ms = next_midnight_after(self.zone, day, start_ms)
            .map_or(self.end_ms, |midnight| midnight.min(self.end_ms));
        self.cursor = end_ms;
        Some(DaySpan {
            day,
            start_ms,
            end_ms,
        })
    }
}

/// Finds the first start of the day after `day` strictly after `after_ms`.
fn next_midnight_after<Z: TimeZone>(zone: &Z, day: NaiveDate, after_ms: i64) -> Option<i64> {
    let candidate = match next_day_start(zone, day) {
        LocalResult::Single(instant) => instant.timestamp_millis(),
        LocalResult::Ambiguous(a, b) => {
            let (a, b) = (a.timestamp_millis(), b.timestamp_millis());
            let (first, second) = (a.min(b), a.max(b));
            if first > after_ms { first } else { second }
        }
        LocalResult::None => return None,
    };
    (candidate > after_ms).then_some(candidate)
}

/// Resolves the start of the first date after `day` that exists in `zone`.
fn next_day_start<Z: TimeZone>(zone: &Z, day: NaiveDate) -> LocalResult<DateTime<Z>> {
    let mut next = day;
    for _ in 0..MAX_SKIPPED_DAYS {
        let Some(succ) = next.succ_opt() else {
            return LocalResult::None;
        };
        next = succ;
        match start_of_day(zone, next) {
            LocalResult::None => {}
            found => return found,
        }
    }
    LocalResult::None
}

/// Resolves the first instant of `day`.
///
/// If midnight falls in a gap, the first existing local time is found in
/// coarse steps and then narrowed to the millisecond.
fn start_of_day<Z: TimeZone>(zone: &Z, day: NaiveDate) -> LocalResult<DateTime<Z>> {
    let midnight = day.and_time(NaiveTime::MIN);
    match zone.from_local_datetime(&midnight) {
        LocalResult::None => {}
        found => return found,
    }

    let step = Duration::minutes(GAP_PROBE_MINUTES);
    let mut probe = midnight + step;
    while probe.date() == day {
        if let Some(after_gap) = zone.from_local_datetime(&probe).earliest() {
            return first_instant_of(zone, day, after_gap.timestamp_millis())
                .map_or(LocalResult::None, LocalResult::Single);
        }
        probe += step;
    }
    LocalResult::None
}

/// Narrows down the earliest instant at or before `hi_ms` that lies on `day`.
///
/// `hi_ms` must already be on `day`.
fn first_instant_of<Z: TimeZone>(zone: &Z, day: NaiveDate, hi_ms: i64) -> Option<DateTime<Z>> {
    let on_day = |ms: i64| local_day(zone, ms).is_some_and(|d| d >= day);
    let step_ms = GAP_PROBE_MINUTES * 60 * 1000;

    let mut hi = hi_ms;
    let mut lo = hi.checked_sub(step_ms)?;
    while on_day(lo) {
        hi = lo;
        lo = lo.checked_sub(step_ms)?;
    }
    // Invariant: `lo` is before `day`, `hi` is on it.
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if on_day(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    DateTime::from_timestamp_millis(hi).map(|utc| utc.with_timezone(zone))
}
