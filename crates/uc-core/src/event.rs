//! Raw device usage events.

use serde::{Deserialize, Serialize};

use crate::event_type::EventType;
use crate::types::{AppId, ValidationError};

/// A single screen or app transition reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the transition happened, in epoch milliseconds.
    pub timestamp_ms: i64,
    /// What happened.
    pub kind: EventKind,
}

/// The transition carried by a [`UsageEvent`].
///
/// App identifiers exist only on the foreground/background variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The screen became interactive.
    ScreenInteractive,
    /// The screen stopped being interactive.
    ScreenNonInteractive,
    /// An app came to the foreground.
    AppForeground { app: AppId },
    /// An app left the foreground.
    AppBackground { app: AppId },
}

impl EventKind {
    /// Returns the payload-free type of this kind.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::ScreenInteractive => EventType::ScreenInteractive,
            Self::ScreenNonInteractive => EventType::ScreenNonInteractive,
            Self::AppForeground { .. } => EventType::AppForeground,
            Self::AppBackground { .. } => EventType::AppBackground,
        }
    }

    /// Returns the app identifier, if this kind carries one.
    #[must_use]
    pub const fn app(&self) -> Option<&AppId> {
        match self {
            Self::AppForeground { app } | Self::AppBackground { app } => Some(app),
            Self::ScreenInteractive | Self::ScreenNonInteractive => None,
        }
    }
}

impl UsageEvent {
    pub const fn screen_interactive(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::ScreenInteractive,
        }
    }

    pub const fn screen_non_interactive(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::ScreenNonInteractive,
        }
    }

    pub const fn foreground(timestamp_ms: i64, app: AppId) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::AppForeground { app },
        }
    }

    pub const fn background(timestamp_ms: i64, app: AppId) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::AppBackground { app },
        }
    }

    /// Builds an event from its flat stored form.
    ///
    /// Fails if an app event has no app or a screen event has one.
    pub fn from_parts(
        timestamp_ms: i64,
        event_type: EventType,
        app: Option<AppId>,
    ) -> Result<Self, ValidationError> {
        let kind = match (event_type, app) {
            (EventType::ScreenInteractive, None) => EventKind::ScreenInteractive,
            (EventType::ScreenNonInteractive, None) => EventKind::ScreenNonInteractive,
            (EventType::AppForeground, Some(app)) => EventKind::AppForeground { app },
            (EventType::AppBackground, Some(app)) => EventKind::AppBackground { app },
            (kind, Some(_)) => return Err(ValidationError::UnexpectedApp { kind }),
            (kind, None) => return Err(ValidationError::MissingApp { kind }),
        };
        Ok(Self { timestamp_ms, kind })
    }

    /// Returns the payload-free type of this event.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Returns the app identifier, if any.
    #[must_use]
    pub const fn app(&self) -> Option<&AppId> {
        self.kind.app()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str) -> AppId {
        AppId::new(id).unwrap()
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = UsageEvent::foreground(1_000, app("com.instagram.android"));

        let json = serde_json::to_string(&event).unwrap();
        let parsed: UsageEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, event);
    }

    #[test]
    fn event_kind_uses_type_tag() {
        let event = UsageEvent::background(2_000, app("com.test"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "app_background");
        assert_eq!(json["kind"]["app"], "com.test");
    }

    #[test]
    fn event_rejects_empty_app() {
        let json = r#"{"timestamp_ms": 1, "kind": {"type": "app_foreground", "app": ""}}"#;
        let result: Result<UsageEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn from_parts_requires_app_for_app_events() {
        let err = UsageEvent::from_parts(1, EventType::AppForeground, None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingApp {
                kind: EventType::AppForeground
            }
        );
    }

    #[test]
    fn from_parts_rejects_app_on_screen_events() {
        let err =
            UsageEvent::from_parts(1, EventType::ScreenInteractive, Some(app("x"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnexpectedApp {
                kind: EventType::ScreenInteractive
            }
        );
    }

    #[test]
    fn from_parts_matches_constructors() {
        let built = UsageEvent::from_parts(5, EventType::AppBackground, Some(app("x"))).unwrap();
        assert_eq!(built, UsageEvent::background(5, app("x")));
        assert_eq!(built.event_type(), EventType::AppBackground);
        assert_eq!(built.app().map(AppId::as_str), Some("x"));
    }
}
