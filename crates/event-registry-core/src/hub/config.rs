//! Hub configuration
//!
//! Loaded from JSON or TOML files; every field has a default so partial
//! files are accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for an [`EventHub`](super::EventHub)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Capacity of the broadcast channel feeding async observers.
    pub channel_capacity: usize,
    /// Listeners per event before a warning is logged. `0` disables the check.
    pub max_listeners: usize,
    /// Whether to keep emission history.
    pub enable_history: bool,
    /// Maximum number of emissions to retain in history.
    pub max_history_size: usize,
    /// How long to retain emissions in history, in seconds.
    pub history_retention_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_listeners: 10,
            enable_history: false,
            max_history_size: 1000,
            history_retention_secs: 300,
        }
    }
}

impl HubConfig {
    /// History retention as a duration
    pub fn history_retention(&self) -> Duration {
        Duration::from_secs(self.history_retention_secs)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("invalid JSON: {}", e),
            })?,
            Format::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("invalid TOML: {}", e),
            })?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded hub config");
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                reason: format!("failed to serialize: {}", e),
            })?,
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                reason: format!("failed to serialize: {}", e),
            })?,
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "channel_capacity",
                reason: "must be > 0".to_string(),
            });
        }

        if self.enable_history && self.max_history_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_history_size",
                reason: "must be > 0 when history is enabled".to_string(),
            });
        }

        Ok(())
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}
