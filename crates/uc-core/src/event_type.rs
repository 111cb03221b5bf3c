//! Event type enum as the single source of truth for event type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical usage event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ScreenInteractive,
    ScreenNonInteractive,
    AppForeground,
    AppBackground,
}

impl EventType {
    /// Returns the canonical string used for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScreenInteractive => "screen_interactive",
            Self::ScreenNonInteractive => "screen_non_interactive",
            Self::AppForeground => "app_foreground",
            Self::AppBackground => "app_background",
        }
    }

    /// Whether events of this type carry an app identifier.
    #[must_use]
    pub const fn takes_app(&self) -> bool {
        matches!(self, Self::AppForeground | Self::AppBackground)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Platform names and numeric codes are accepted as legacy aliases.
        match s {
            "screen_interactive" | "15" => Ok(Self::ScreenInteractive),
            "screen_non_interactive" | "16" => Ok(Self::ScreenNonInteractive),
            "app_foreground" | "activity_resumed" | "1" => Ok(Self::AppForeground),
            "app_background" | "activity_paused" | "2" => Ok(Self::AppBackground),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}
