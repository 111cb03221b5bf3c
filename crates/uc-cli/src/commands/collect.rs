//! Collect command: one aggregation pass over the buffered events.
//!
//! Reads the stored state (or seeds a first-run state), feeds every event in
//! `[watermark, now)` through the aggregator, and commits totals, intervals,
//! and the advanced watermark in one transaction.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use uc_core::{SessionAggregator, SessionState};
use uc_db::Database;

use crate::Config;
use crate::commands::util::{format_duration, format_timestamp};

/// Outcome of a collection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    /// Watermark the pass started from.
    pub from_ms: i64,
    /// Watermark after the pass.
    pub to_ms: i64,
    /// Events fed to the aggregator.
    pub events: usize,
    /// Usage recorded by this pass across all days.
    pub recorded_ms: i64,
    /// Buffered events deleted after the pass.
    pub pruned: usize,
    /// State carried into the next pass.
    pub state: SessionState,
}

pub fn run(
    db: &mut Database,
    config: &Config,
    now: DateTime<Utc>,
    prune: bool,
) -> Result<CollectSummary> {
    let zone = config.zone()?;
    let aggregator = SessionAggregator::new(zone, config.aggregator_config());
    let mut now_ms = now.timestamp_millis();

    let prev = match db.load_state().context("failed to load collector state")? {
        Some(state) => state,
        None => {
            let watermark = now_ms.saturating_sub(config.first_run_lookback_ms);
            tracing::info!(watermark, "no stored state, starting first run");
            SessionState::first_run(watermark, config.initial_screen_interactive)
        }
    };

    if now_ms < prev.last_processed_ms {
        tracing::warn!(
            now_ms,
            watermark = prev.last_processed_ms,
            "clock is behind the stored watermark, holding position"
        );
        now_ms = prev.last_processed_ms;
    }

    let events = db
        .events_in_range(prev.last_processed_ms, now_ms)
        .context("failed to read buffered events")?;
    tracing::debug!(
        from = prev.last_processed_ms,
        to = now_ms,
        events = events.len(),
        "collection window"
    );
    let outcome = db
        .apply_batch(&aggregator, &prev, &events, now_ms)
        .context("failed to apply batch")?;
    let (next, recorded_ms) = (outcome.state, outcome.recorded_ms);

    let pruned = if prune {
        db.prune_events_before(next.last_processed_ms)
            .context("failed to prune events")?
    } else {
        0
    };

    tracing::info!(
        from = prev.last_processed_ms,
        to = next.last_processed_ms,
        events = events.len(),
        recorded_ms,
        pruned,
        "collection pass complete"
    );

    Ok(CollectSummary {
        from_ms: prev.last_processed_ms,
        to_ms: next.last_processed_ms,
        events: events.len(),
        recorded_ms,
        pruned,
        state: next,
    })
}

/// One-line description of a pass, in the reference zone.
pub fn format_summary(summary: &CollectSummary, config: &Config) -> Result<String> {
    let zone = config.zone()?;
    let mut line = format!(
        "Processed {} event(s) from {} to {}, recorded {}",
        summary.events,
        format_timestamp(&zone, summary.from_ms),
        format_timestamp(&zone, summary.to_ms),
        format_duration(summary.recorded_ms),
    );
    if summary.pruned > 0 {
        write!(line, ", pruned {}", summary.pruned)?;
    }
    Ok(line)
}
