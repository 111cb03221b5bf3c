//! The persisted collector snapshot.

use serde::{Deserialize, Serialize};

use crate::types::AppId;

/// Which app, if any, is in the foreground and whether it is being counted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Foreground {
    /// No app is in the foreground.
    #[default]
    Empty,
    /// An app is in the foreground but no segment is open for it.
    Parked { app: AppId },
    /// An app is in the foreground and its segment accumulates from `start_ms`.
    Open { app: AppId, start_ms: i64 },
}

impl Foreground {
    /// Returns the foreground app, open or parked.
    #[must_use]
    pub const fn app(&self) -> Option<&AppId> {
        match self {
            Self::Empty => None,
            Self::Parked { app } | Self::Open { app, .. } => Some(app),
        }
    }

    /// Returns the open segment start, if a segment is open.
    #[must_use]
    pub const fn open_start(&self) -> Option<i64> {
        match self {
            Self::Open { start_ms, .. } => Some(*start_ms),
            Self::Empty | Self::Parked { .. } => None,
        }
    }

    /// Stops counting while keeping the app in the foreground.
    #[must_use]
    pub fn parked(self) -> Self {
        match self {
            Self::Open { app, .. } => Self::Parked { app },
            other => other,
        }
    }
}

/// Snapshot carried from one aggregation pass to the next.
///
/// This is the only state the collector persists. `foreground` may only be
/// [`Foreground::Open`] while `screen_interactive` is true; other combinations
/// are normalized by [`SessionState::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Watermark: events before this instant have been consumed.
    pub last_processed_ms: i64,
    /// Whether the screen is currently interactive.
    pub screen_interactive: bool,
    /// The foreground app and its open segment.
    #[serde(default)]
    pub foreground: Foreground,
}

impl SessionState {
    /// Synthesizes the state for the very first pass, when nothing is stored yet.
    #[must_use]
    pub const fn first_run(watermark_ms: i64, screen_interactive: bool) -> Self {
        Self {
            last_processed_ms: watermark_ms,
            screen_interactive,
            foreground: Foreground::Empty,
        }
    }

    /// Rebuilds a state from its flat persisted columns.
    ///
    /// A segment start without an app, or with the screen off, is dropped.
    #[must_use]
    pub fn from_parts(
        last_processed_ms: i64,
        screen_interactive: bool,
        active_app: Option<AppId>,
        segment_start_ms: Option<i64>,
    ) -> Self {
        let foreground = match (active_app, segment_start_ms) {
            (None, _) => Foreground::Empty,
            (Some(app), Some(start_ms)) => Foreground::Open { app, start_ms },
            (Some(app), None) => Foreground::Parked { app },
        };
        Self {
            last_processed_ms,
            screen_interactive,
            foreground,
        }
        .normalized()
    }

    /// Returns the state with an open segment parked if the screen is off.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.screen_interactive {
            return self;
        }
        Self {
            foreground: self.foreground.parked(),
            ..self
        }
    }

    /// Returns the foreground app, if any.
    #[must_use]
    pub const fn active_app(&self) -> Option<&AppId> {
        self.foreground.app()
    }

    /// Returns the open segment start; only meaningful while interactive.
    #[must_use]
    pub const fn segment_start_ms(&self) -> Option<i64> {
        if self.screen_interactive {
            self.foreground.open_start()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str) -> AppId {
        AppId::new(id).unwrap()
    }

    #[test]
    fn first_run_has_no_foreground() {
        let state = SessionState::first_run(100, true);
        assert_eq!(state.last_processed_ms, 100);
        assert!(state.screen_interactive);
        assert_eq!(state.foreground, Foreground::Empty);
        assert_eq!(state.segment_start_ms(), None);
    }

    #[test]
    fn from_parts_builds_open_segment() {
        let state = SessionState::from_parts(0, true, Some(app("a")), Some(1_000));
        assert_eq!(
            state.foreground,
            Foreground::Open {
                app: app("a"),
                start_ms: 1_000
            }
        );
        assert_eq!(state.segment_start_ms(), Some(1_000));
    }

    #[test]
    fn from_parts_drops_start_without_app() {
        let state = SessionState::from_parts(0, true, None, Some(1_000));
        assert_eq!(state.foreground, Foreground::Empty);
    }

    #[test]
    fn from_parts_parks_segment_when_screen_off() {
        let state = SessionState::from_parts(0, false, Some(app("a")), Some(1_000));
        assert_eq!(state.foreground, Foreground::Parked { app: app("a") });
        assert_eq!(state.active_app(), Some(&app("a")));
        assert_eq!(state.segment_start_ms(), None);
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = SessionState::from_parts(5_000, true, Some(app("a")), Some(5_000));
        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
