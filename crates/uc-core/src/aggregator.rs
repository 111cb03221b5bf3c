//! Session aggregation.
//!
//! Folds an ordered batch of usage events over the previous [`SessionState`],
//! closing usage segments into a [`UsageSink`] and returning the next state.
//!
//! # Algorithm Summary
//!
//! 1. Replay events in order, tracking the screen flag and the foreground app
//! 2. Close the open segment on screen-off, on a switch to another app, and
//!    when the foreground app goes to the background
//! 3. At the end of the window, close the open segment at `now` and reopen it
//!    there so the session carries over into the next pass
//!
//! Every closed candidate below the minimum duration is dropped as a whole;
//! the rest is cut at local midnight in the reference zone.

use chrono::TimeZone;
use tracing::{debug, trace, warn};

use crate::day::{local_day, split_by_day};
use crate::event::{EventKind, UsageEvent};
use crate::segment::UsageSegment;
use crate::sink::UsageSink;
use crate::state::{Foreground, SessionState};
use crate::types::AppId;

/// Configuration for session aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Closed segments shorter than this are discarded before day splitting.
    /// Default: 1000 (1 second).
    pub min_segment_ms: i64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_segment_ms: 1_000,
        }
    }
}

/// Turns usage events into per-day usage segments.
///
/// Holds no state between calls; everything carried over lives in the
/// [`SessionState`] passed to and returned from [`process`](Self::process).
#[derive(Debug, Clone)]
pub struct SessionAggregator<Z: TimeZone> {
    zone: Z,
    config: AggregatorConfig,
}

impl<Z: TimeZone> SessionAggregator<Z> {
    /// Creates an aggregator bucketing days in `zone`.
    pub const fn new(zone: Z, config: AggregatorConfig) -> Self {
        Self { zone, config }
    }

    pub const fn zone(&self) -> &Z {
        &self.zone
    }

    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Processes one window of events.
    ///
    /// Events must be ordered by timestamp and `now_ms` must not precede the
    /// last of them. Violations are clamped: an event earlier than its
    /// predecessor is treated as simultaneous with it, and `now_ms` is raised
    /// to the last event. The returned state's watermark is the effective `now`.
    ///
    /// The only possible error comes from the sink.
    pub fn process<S>(
        &self,
        prev: &SessionState,
        events: &[UsageEvent],
        now_ms: i64,
        sink: &mut S,
    ) -> Result<SessionState, S::Error>
    where
        S: UsageSink + ?Sized,
    {
        let prev = prev.clone().normalized();
        let mut screen_interactive = prev.screen_interactive;
        let mut foreground = prev.foreground;
        let mut clock = foreground.open_start().unwrap_or(i64::MIN);
        let mut emitted = 0;

        for event in events {
            let ts = if event.timestamp_ms < clock {
                warn!(
                    timestamp_ms = event.timestamp_ms,
                    clamped_to = clock,
                    kind = %event.event_type(),
                    "out-of-order event clamped"
                );
                clock
            } else {
                event.timestamp_ms
            };
            clock = ts;

            match &event.kind {
                EventKind::ScreenInteractive => {
                    screen_interactive = true;
                    // Counting restarts here, whatever was open before.
                    foreground = match foreground {
                        Foreground::Empty => Foreground::Empty,
                        Foreground::Parked { app } | Foreground::Open { app, .. } => {
                            Foreground::Open { app, start_ms: ts }
                        }
                    };
                }

                EventKind::ScreenNonInteractive => {
                    if let Foreground::Open { app, start_ms } = &foreground {
                        emitted += self.close(*start_ms, ts, app, sink)?;
                    }
                    screen_interactive = false;
                    foreground = foreground.parked();
                }

                EventKind::AppForeground { app } => {
                    if let Foreground::Open {
                        app: previous,
                        start_ms,
                    } = &foreground
                    {
                        // Same app again: no close, but the start still moves below.
                        if previous != app {
                            emitted += self.close(*start_ms, ts, previous, sink)?;
                        }
                    }
                    foreground = if screen_interactive {
                        Foreground::Open {
                            app: app.clone(),
                            start_ms: ts,
                        }
                    } else {
                        Foreground::Parked { app: app.clone() }
                    };
                }

                EventKind::AppBackground { app } => {
                    if foreground.app() == Some(app) {
                        if let Foreground::Open { start_ms, .. } = &foreground {
                            emitted += self.close(*start_ms, ts, app, sink)?;
                        }
                        foreground = Foreground::Empty;
                    }
                }
            }
        }

        let now_ms = if now_ms < clock {
            warn!(now_ms, clamped_to = clock, "window end precedes last event");
            clock
        } else {
            now_ms
        };

        // Tail close: count up to now, then keep the session open for the next pass.
        if let Foreground::Open { app, start_ms } = &mut foreground {
            if now_ms > *start_ms {
                emitted += self.close(*start_ms, now_ms, app, sink)?;
                *start_ms = now_ms;
                trace!(app = %app, now_ms, "open segment carried over");
            }
        }

        debug!(
            events = events.len(),
            emitted,
            now_ms,
            screen_interactive,
            active_app = ?foreground.app().map(AppId::as_str),
            "aggregation pass complete"
        );

        Ok(SessionState {
            last_processed_ms: now_ms,
            screen_interactive,
            foreground,
        })
    }

    /// Emits `[start_ms, end_ms)` for `app`, split by day. Returns the number of pieces.
    fn close<S>(
        &self,
        start_ms: i64,
        end_ms: i64,
        app: &AppId,
        sink: &mut S,
    ) -> Result<usize, S::Error>
    where
        S: UsageSink + ?Sized,
    {
        if end_ms <= start_ms {
            return Ok(0);
        }
        let duration_ms = end_ms.saturating_sub(start_ms);
        if duration_ms < self.config.min_segment_ms {
            trace!(app = %app, duration_ms, "segment below threshold dropped");
            return Ok(0);
        }
        if local_day(&self.zone, start_ms).is_none() || local_day(&self.zone, end_ms).is_none() {
            warn!(app = %app, start_ms, end_ms, "segment outside representable time dropped");
            return Ok(0);
        }

        let mut pieces = 0;
        for span in split_by_day(&self.zone, start_ms, end_ms) {
            sink.record_duration(span.day, app, span.duration_ms())?;
            sink.record_interval(&UsageSegment {
                day: span.day,
                app: app.clone(),
                start_ms: span.start_ms,
                end_ms: span.end_ms,
            })?;
            pieces += 1;
        }
        Ok(pieces)
    }
}
