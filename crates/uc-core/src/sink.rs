//! Output capability the aggregator writes into.

use std::collections::BTreeMap;
use std::convert::Infallible;

use chrono::NaiveDate;

use crate::segment::UsageSegment;
use crate::types::AppId;

/// Consumer of aggregation output.
///
/// Calls arrive in event order. For every closed piece the aggregator calls
/// [`record_duration`](Self::record_duration) followed by
/// [`record_interval`](Self::record_interval). Implementations may buffer but
/// must keep that order.
pub trait UsageSink {
    /// Error raised by the backing store.
    type Error;

    /// Adds `delta_ms` to the running total of `app` on `day`.
    fn record_duration(
        &mut self,
        day: NaiveDate,
        app: &AppId,
        delta_ms: i64,
    ) -> Result<(), Self::Error>;

    /// Appends one segment to the interval log.
    fn record_interval(&mut self, segment: &UsageSegment) -> Result<(), Self::Error>;
}

impl<S: UsageSink + ?Sized> UsageSink for &mut S {
    type Error = S::Error;

    fn record_duration(
        &mut self,
        day: NaiveDate,
        app: &AppId,
        delta_ms: i64,
    ) -> Result<(), Self::Error> {
        (**self).record_duration(day, app, delta_ms)
    }

    fn record_interval(&mut self, segment: &UsageSegment) -> Result<(), Self::Error> {
        (**self).record_interval(segment)
    }
}

/// One call received by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Duration {
        day: NaiveDate,
        app: AppId,
        delta_ms: i64,
    },
    Interval(UsageSegment),
}

/// A sink that keeps every call in memory, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    calls: Vec<SinkCall>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call in arrival order.
    #[must_use]
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Recorded intervals in arrival order.
    pub fn intervals(&self) -> impl Iterator<Item = &UsageSegment> {
        self.calls.iter().filter_map(|call| match call {
            SinkCall::Interval(segment) => Some(segment),
            SinkCall::Duration { .. } => None,
        })
    }

    /// Recorded duration deltas in arrival order.
    pub fn durations(&self) -> impl Iterator<Item = (NaiveDate, &AppId, i64)> {
        self.calls.iter().filter_map(|call| match call {
            SinkCall::Duration { day, app, delta_ms } => Some((*day, app, *delta_ms)),
            SinkCall::Interval(_) => None,
        })
    }

    /// Accumulated duration per `(day, app)`.
    #[must_use]
    pub fn totals(&self) -> BTreeMap<(NaiveDate, AppId), i64> {
        let mut totals = BTreeMap::new();
        for (day, app, delta_ms) in self.durations() {
            *totals.entry((day, app.clone())).or_insert(0) += delta_ms;
        }
        totals
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl UsageSink for MemorySink {
    type Error = Infallible;

    fn record_duration(
        &mut self,
        day: NaiveDate,
        app: &AppId,
        delta_ms: i64,
    ) -> Result<(), Self::Error> {
        self.calls.push(SinkCall::Duration {
            day,
            app: app.clone(),
            delta_ms,
        });
        Ok(())
    }

    fn record_interval(&mut self, segment: &UsageSegment) -> Result<(), Self::Error> {
        self.calls.push(SinkCall::Interval(segment.clone()));
        Ok(())
    }
}
