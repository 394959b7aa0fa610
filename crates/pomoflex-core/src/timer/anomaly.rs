//! Clock-jump classification.
//!
//! Laptops sleep, NTP corrects, users change the system time. Deltas between
//! two consecutive samples inside the tolerance band are ordinary drift;
//! anything outside is a jump the engine corrects for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeJump {
    Normal,
    ForwardJump,
    BackwardJump,
}

/// Tolerance band for sample deltas, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Largest backward step still treated as drift.
    pub backward_tolerance_ms: u64,
    /// Largest forward step still treated as drift (covers overnight sleep).
    pub forward_tolerance_ms: u64,
}

pub const DEFAULT_BACKWARD_TOLERANCE_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_FORWARD_TOLERANCE_MS: u64 = 48 * 60 * 60 * 1000;

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            backward_tolerance_ms: DEFAULT_BACKWARD_TOLERANCE_MS,
            forward_tolerance_ms: DEFAULT_FORWARD_TOLERANCE_MS,
        }
    }
}

impl AnomalyThresholds {
    /// Classify the step from `previous` to `current`. Deltas exactly on a
    /// threshold are `Normal`.
    pub fn classify(&self, previous: DateTime<Utc>, current: DateTime<Utc>) -> TimeJump {
        let delta_ms = (current - previous).num_milliseconds();
        if delta_ms < 0 {
            if delta_ms.unsigned_abs() > self.backward_tolerance_ms {
                return TimeJump::BackwardJump;
            }
        } else if delta_ms.unsigned_abs() > self.forward_tolerance_ms {
            return TimeJump::ForwardJump;
        }
        TimeJump::Normal
    }
}

/// [`AnomalyThresholds::classify`] with the default band.
pub fn classify(previous: DateTime<Utc>, current: DateTime<Utc>) -> TimeJump {
    AnomalyThresholds::default().classify(previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn drift_inside_band_is_normal() {
        let t0 = Utc::now();
        assert_eq!(classify(t0, t0), TimeJump::Normal);
        assert_eq!(classify(t0, t0 + Duration::seconds(1)), TimeJump::Normal);
        assert_eq!(classify(t0, t0 + Duration::hours(9)), TimeJump::Normal);
        assert_eq!(classify(t0, t0 - Duration::minutes(4)), TimeJump::Normal);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let t0 = Utc::now();
        assert_eq!(classify(t0, t0 - Duration::minutes(5)), TimeJump::Normal);
        assert_eq!(classify(t0, t0 + Duration::hours(48)), TimeJump::Normal);
        assert_eq!(
            classify(t0, t0 - Duration::minutes(5) - Duration::milliseconds(1)),
            TimeJump::BackwardJump
        );
        assert_eq!(
            classify(t0, t0 + Duration::hours(48) + Duration::milliseconds(1)),
            TimeJump::ForwardJump
        );
    }

    #[test]
    fn custom_thresholds() {
        let strict = AnomalyThresholds {
            backward_tolerance_ms: 1_000,
            forward_tolerance_ms: 60_000,
        };
        let t0 = Utc::now();
        assert_eq!(strict.classify(t0, t0 - Duration::seconds(2)), TimeJump::BackwardJump);
        assert_eq!(strict.classify(t0, t0 + Duration::minutes(2)), TimeJump::ForwardJump);
    }
}
