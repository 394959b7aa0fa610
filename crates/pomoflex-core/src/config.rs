//! Timer configuration.
//!
//! Holds the per-state target durations and the focus failure threshold.
//! The configuration is persisted as part of the snapshot, not in the
//! settings file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timer::TimerState;

/// User-facing timer configuration. All durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_reflection_duration")]
    pub reflection_duration: u32,
    #[serde(default = "default_rest_duration")]
    pub rest_duration: u32,
    /// Minimum Focus minutes before switching away is not penalized.
    #[serde(default = "default_focus_failure_time")]
    pub focus_failure_time: u32,
    #[serde(default = "default_true")]
    pub enable_sound: bool,
    #[serde(default = "default_true")]
    pub enable_notification: bool,
}

fn default_focus_duration() -> u32 {
    25
}
fn default_reflection_duration() -> u32 {
    5
}
fn default_rest_duration() -> u32 {
    5
}
fn default_focus_failure_time() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            reflection_duration: default_reflection_duration(),
            rest_duration: default_rest_duration(),
            focus_failure_time: default_focus_failure_time(),
            enable_sound: true,
            enable_notification: true,
        }
    }
}

const MS_PER_MIN: u64 = 60 * 1000;

impl TimerConfig {
    /// Check the duration invariants.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("focus_duration", self.focus_duration),
            ("reflection_duration", self.reflection_duration),
            ("rest_duration", self.rest_duration),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than 0".into(),
                });
            }
        }
        if self.focus_failure_time > self.focus_duration {
            return Err(ConfigError::InvalidValue {
                key: "focus_failure_time".into(),
                message: format!(
                    "{} exceeds focus_duration ({})",
                    self.focus_failure_time, self.focus_duration
                ),
            });
        }
        Ok(())
    }

    /// Target duration in minutes for a state. `None` for Idle.
    pub fn target_minutes(&self, state: TimerState) -> Option<u32> {
        match state {
            TimerState::Idle => None,
            TimerState::Focus => Some(self.focus_duration),
            TimerState::Reflection => Some(self.reflection_duration),
            TimerState::Rest => Some(self.rest_duration),
        }
    }

    /// Target duration in milliseconds for a state. `None` for Idle.
    pub fn target_ms(&self, state: TimerState) -> Option<u64> {
        self.target_minutes(state)
            .map(|min| u64::from(min).saturating_mul(MS_PER_MIN))
    }

    pub fn focus_failure_ms(&self) -> u64 {
        u64::from(self.focus_failure_time).saturating_mul(MS_PER_MIN)
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Return a copy with one field replaced, parsed from `value`.
    ///
    /// The result is validated, so a value that breaks the duration
    /// invariants is rejected here rather than at dispatch time.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value does not parse as
    /// the field's type, or the resulting config is invalid.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self, ConfigError> {
        let mut json = serde_json::to_value(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("config is not an object".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.into(),
            message,
        };
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as minutes")))?
                    .into(),
            ),
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(key.to_string(), new_value);

        let cfg: Self =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
