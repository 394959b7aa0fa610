//! TOML-based host settings.
//!
//! Stores engine knobs that are not part of the user's timer config:
//! - Clock-jump tolerance band
//! - Tick interval used by hosts that drive the engine
//!
//! Settings are stored at `~/.config/pomoflex/settings.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{AnomalyThresholds, DEFAULT_BACKWARD_TOLERANCE_MS, DEFAULT_FORWARD_TOLERANCE_MS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalySettings {
    #[serde(default = "default_backward_tolerance_secs")]
    pub backward_tolerance_secs: u64,
    #[serde(default = "default_forward_tolerance_secs")]
    pub forward_tolerance_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub anomaly: AnomalySettings,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_backward_tolerance_secs() -> u64 {
    DEFAULT_BACKWARD_TOLERANCE_MS / 1000
}
fn default_forward_tolerance_secs() -> u64 {
    DEFAULT_FORWARD_TOLERANCE_MS / 1000
}
fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            backward_tolerance_secs: default_backward_tolerance_secs(),
            forward_tolerance_secs: default_forward_tolerance_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anomaly: AnomalySettings::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Settings {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("settings.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("settings.toml"))
    }

    /// Load from the data directory, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default settings cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default settings cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default settings");
            Self::default()
        })
    }

    pub fn thresholds(&self) -> AnomalyThresholds {
        AnomalyThresholds {
            backward_tolerance_ms: self.anomaly.backward_tolerance_secs.saturating_mul(1000),
            forward_tolerance_ms: self.anomaly.forward_tolerance_secs.saturating_mul(1000),
        }
    }
}
