//! Timer state primitives and the flags derived from them.
//!
//! Only primitives are stored in [`TimerStateData`]. Everything else
//! (`is_default_time_reached`, `can_switch_state`, the available actions)
//! is computed on read by the free functions in this module.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TimerConfig;
use crate::history::ReflectionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Focus,
    Reflection,
    Rest,
}

impl TimerState {
    pub fn is_idle(self) -> bool {
        self == TimerState::Idle
    }

    /// The kind of session this state records, if any.
    pub fn session_type(self) -> Option<SessionType> {
        match self {
            TimerState::Idle => None,
            TimerState::Focus => Some(SessionType::Focus),
            TimerState::Reflection => Some(SessionType::Reflection),
            TimerState::Rest => Some(SessionType::Rest),
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Focus => "focus",
            TimerState::Reflection => "reflection",
            TimerState::Rest => "rest",
        };
        f.write_str(s)
    }
}

/// Type of a recorded session. Idle never produces a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Focus,
    Reflection,
    Rest,
}

impl From<SessionType> for TimerState {
    fn from(t: SessionType) -> Self {
        match t {
            SessionType::Focus => TimerState::Focus,
            SessionType::Reflection => TimerState::Reflection,
            SessionType::Rest => TimerState::Rest,
        }
    }
}

/// Persisted primitive timer state.
///
/// `start_time`, `last_sample_time` and `session_id` are present exactly
/// when `current_state` is not Idle. The engine is the only writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimerStateData {
    pub current_state: TimerState,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds since `start_time` as of `last_sample_time`.
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub last_sample_time: Option<DateTime<Utc>>,
    /// Id the open session's record will carry.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Set when a clock jump was corrected during the open session.
    #[serde(default)]
    pub was_interrupted: bool,
    /// Note written during an open Reflection session; moves onto its
    /// record when the session closes.
    #[serde(default)]
    pub reflection_summary: Option<ReflectionSummary>,
}

impl TimerStateData {
    /// A freshly opened session of `state` at `now`.
    pub(crate) fn open(state: TimerState, session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            current_state: state,
            start_time: Some(now),
            elapsed_ms: 0,
            last_sample_time: Some(now),
            session_id: Some(session_id),
            was_interrupted: false,
            reflection_summary: None,
        }
    }

    pub fn is_consistent(&self) -> bool {
        if self.current_state != TimerState::Reflection && self.reflection_summary.is_some() {
            return false;
        }
        if self.current_state.is_idle() {
            self.start_time.is_none()
                && self.last_sample_time.is_none()
                && self.session_id.is_none()
                && self.elapsed_ms == 0
                && !self.was_interrupted
        } else {
            self.start_time.is_some()
                && self.last_sample_time.is_some()
                && self.session_id.as_deref().is_some_and(|id| !id.is_empty())
        }
    }
}

/// `elapsed_ms >= target` for the current state. Always false when Idle.
pub fn is_default_time_reached(data: &TimerStateData, config: &TimerConfig) -> bool {
    config
        .target_ms(data.current_state)
        .is_some_and(|target| data.elapsed_ms >= target)
}

/// True unless a Focus session is still below the failure threshold.
pub fn can_switch_state(data: &TimerStateData, config: &TimerConfig) -> bool {
    data.current_state != TimerState::Focus || data.elapsed_ms >= config.focus_failure_ms()
}

/// Which user actions the current state permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    pub can_start_focus: bool,
    pub can_switch_to_reflection: bool,
    pub can_switch_to_rest: bool,
    pub can_cancel: bool,
}

impl AvailableActions {
    pub fn compute(state: TimerState, can_switch_state: bool) -> Self {
        match state {
            TimerState::Idle => Self {
                can_start_focus: true,
                can_switch_to_reflection: false,
                can_switch_to_rest: false,
                can_cancel: false,
            },
            TimerState::Focus => Self {
                can_start_focus: false,
                can_switch_to_reflection: can_switch_state,
                can_switch_to_rest: can_switch_state,
                can_cancel: true,
            },
            TimerState::Reflection => Self {
                can_start_focus: false,
                can_switch_to_reflection: false,
                can_switch_to_rest: true,
                can_cancel: true,
            },
            TimerState::Rest => Self {
                can_start_focus: true,
                can_switch_to_reflection: false,
                can_switch_to_rest: false,
                can_cancel: true,
            },
        }
    }

    pub fn of(data: &TimerStateData, config: &TimerConfig) -> Self {
        Self::compute(data.current_state, can_switch_state(data, config))
    }
}

/// Read-only view of the timer: primitives plus every derived flag.
///
/// This is what hosts render and what `Event::StateChanged` carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub current_state: TimerState,
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    pub target_ms: Option<u64>,
    pub remaining_ms: Option<u64>,
    pub is_default_time_reached: bool,
    pub can_switch_state: bool,
    pub available_actions: AvailableActions,
}

impl TimerStatus {
    pub fn project(data: &TimerStateData, config: &TimerConfig) -> Self {
        let target_ms = config.target_ms(data.current_state);
        let can_switch = can_switch_state(data, config);
        Self {
            current_state: data.current_state,
            start_time: data.start_time,
            elapsed_ms: data.elapsed_ms,
            target_ms,
            remaining_ms: target_ms.map(|t| t.saturating_sub(data.elapsed_ms)),
            is_default_time_reached: is_default_time_reached(data, config),
            can_switch_state: can_switch,
            available_actions: AvailableActions::compute(data.current_state, can_switch),
        }
    }
}
