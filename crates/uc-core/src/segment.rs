//! Closed usage segments emitted by the aggregator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::AppId;

/// A contiguous span of counted usage for one app, within one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSegment {
    /// Calendar day in the reference zone.
    pub day: NaiveDate,
    pub app: AppId,
    /// Inclusive start, epoch milliseconds.
    pub start_ms: i64,
    /// Exclusive end, epoch milliseconds.
    pub end_ms: i64,
}

impl UsageSegment {
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}
