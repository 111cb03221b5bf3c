//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_type::EventType;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A foreground/background event arrived without an app identifier.
    #[error("{kind} event requires an app identifier")]
    MissingApp { kind: EventType },

    /// A screen event carried an app identifier.
    #[error("{kind} event does not take an app identifier")]
    UnexpectedApp { kind: EventType },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated application identifier (package name, bundle id, ...).
    ///
    /// App IDs must be non-empty strings.
    AppId, "app ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_rejects_empty() {
        assert!(AppId::new("").is_err());
        assert!(AppId::new("com.example.app").is_ok());
    }

    #[test]
    fn app_id_serde_rejects_empty() {
        let result: Result<AppId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn app_id_serializes_as_plain_string() {
        let id = AppId::new("com.reddit.frontpage").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"com.reddit.frontpage\"");
    }

    #[test]
    fn app_id_as_ref() {
        let id = AppId::new("com.test").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "com.test");
    }

    #[test]
    fn missing_app_message_names_kind() {
        let err = ValidationError::MissingApp {
            kind: EventType::AppForeground,
        };
        assert_eq!(
            err.to_string(),
            "app_foreground event requires an app identifier"
        );
    }
}
