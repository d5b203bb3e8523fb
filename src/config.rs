//! Configuration for the dashboard client.

use crate::client::{ApiConfig, DEFAULT_BASE_URL};
use crate::core::DEFAULT_LOW_FOCUS_THRESHOLD;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the dashboard client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the telemetry service
    pub base_url: String,

    /// How often the selected session is re-polled
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Directory export artifacts are written to
    pub export_path: PathBuf,

    /// Focused percent below which the low-focus alert fires
    pub low_focus_threshold: u8,

    /// IANA timezone whose calendar dates group historical sessions
    pub catalog_timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wili-dash");

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            export_path: data_dir.join("exports"),
            low_focus_threshold: DEFAULT_LOW_FOCUS_THRESHOLD,
            catalog_timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let config_path = Self::config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wili-dash")
            .join("config.json")
    }

    /// Parse the catalog timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.catalog_timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::ParseError(format!("catalog_timezone: {e}")))
    }

    /// Endpoint settings for the HTTP client.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url.clone()).with_timeout(self.request_timeout)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole, non-zero seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        if secs == 0 {
            return Err(serde::de::Error::custom("duration must be at least 1 second"));
        }
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.low_focus_threshold, 30);
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
        assert_eq!(config.api_config().url(), "http://localhost:8085");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"base_url": "http://10.0.0.2:8085", "poll_interval": 2}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:8085");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let err = serde_json::from_str::<Config>(r#"{"poll_interval": 0}"#).unwrap_err();
        assert!(err.to_string().contains("at least 1 second"));
        assert!(serde_json::from_str::<Config>(r#"{"request_timeout": 0}"#).is_err());
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = std::env::temp_dir().join(format!("wili-dash-config-test-{}", std::process::id()));
        let path = dir.join("config.json");
        let config = Config {
            base_url: "http://10.0.0.2:8085".to_string(),
            poll_interval: Duration::from_secs(3),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "http://10.0.0.2:8085");
        assert_eq!(loaded.poll_interval, Duration::from_secs(3));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_timezone() {
        let config = Config {
            catalog_timezone: "Mars/Olympus".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.timezone(), Err(ConfigError::ParseError(_))));
    }
}
