//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use uc_core::AggregatorConfig;

/// First-run safety window: how far back the very first pass looks.
const DEFAULT_FIRST_RUN_LOOKBACK_MS: i64 = 20 * 60 * 1000;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// IANA name of the zone used to bucket days. Unset means the system zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Segments shorter than this are not recorded.
    pub min_segment_ms: i64,

    /// How far back the first pass looks when no state is stored yet.
    pub first_run_lookback_ms: i64,

    /// Screen flag assumed by the first pass.
    pub initial_screen_interactive: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("timezone", &self.timezone)
            .field("min_segment_ms", &self.min_segment_ms)
            .field("first_run_lookback_ms", &self.first_run_lookback_ms)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("uc.db"),
            timezone: None,
            min_segment_ms: AggregatorConfig::default().min_segment_ms,
            first_run_lookback_ms: DEFAULT_FIRST_RUN_LOOKBACK_MS,
            initial_screen_interactive: true,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (UC_*)
        figment = figment.merge(Env::prefixed("UC_"));

        figment.extract()
    }

    /// Name of the reference zone: the configured one, else the system zone, else UTC.
    pub fn timezone_name(&self) -> String {
        self.timezone.clone().unwrap_or_else(|| {
            iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
        })
    }

    /// Resolves the reference zone.
    pub fn zone(&self) -> Result<Tz> {
        let name = self.timezone_name();
        name.parse::<Tz>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid timezone: {name}"))
    }

    /// Aggregator settings derived from this configuration.
    pub const fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            min_segment_ms: self.min_segment_ms,
        }
    }
}

/// Returns the platform-specific config directory for uc.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("uc"))
}

/// Returns the platform-specific data directory for uc.
///
/// On Linux: `~/.local/share/uc`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("uc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_dirs_data_path_ends_with_uc() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "uc");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("uc.db"));
    }

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.min_segment_ms, 1_000);
        assert_eq!(config.first_run_lookback_ms, 1_200_000);
        assert!(config.initial_screen_interactive);
        assert_eq!(config.aggregator_config(), AggregatorConfig::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/tmp/usage.db"
timezone = "Europe/Bratislava"
min_segment_ms = 0
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/usage.db"));
        assert_eq!(config.min_segment_ms, 0);
        assert_eq!(config.zone().unwrap(), chrono_tz::Europe::Bratislava);
    }

    #[test]
    fn test_explicit_timezone_wins() {
        let config = Config {
            timezone: Some("UTC".to_string()),
            ..Config::default()
        };
        assert_eq!(config.timezone_name(), "UTC");
        assert_eq!(config.zone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let config = Config {
            timezone: Some("Mars/Olympus_Mons".to_string()),
            ..Config::default()
        };
        let err = config.zone().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }
}
