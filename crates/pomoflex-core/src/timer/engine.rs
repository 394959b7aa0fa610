//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads or read the system clock - every operation takes an
//! explicit `now`, and the caller is responsible for calling `tick()`
//! periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Focus -> (Reflection -> Rest | Rest) -> Focus -> ...
//!   ^                                                  |
//!   +----------------------- cancel -------------------+
//! ```
//!
//! Leaving Focus early (before `focus_failure_time`) is only possible via
//! `cancel`, and records the session as failed.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start_focus(Utc::now())?;
//! // In a loop:
//! let events = engine.tick(Utc::now());
//! ```

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::anomaly::{AnomalyThresholds, TimeJump};
use super::state::{
    can_switch_state, is_default_time_reached, AvailableActions, SessionType, TimerState,
    TimerStateData, TimerStatus,
};
use super::streak::{ContinuousFocusStreak, StreakChange};
use crate::config::TimerConfig;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::history::{ReflectionSummary, SessionHistory, SessionMetadata, SessionRecord};
use crate::storage::Snapshot;

/// Core timer engine.
///
/// Owns the timer state, the configuration, the closed-session history and
/// the focus streak. Every failed operation leaves all of them untouched.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerStateData,
    config: TimerConfig,
    history: SessionHistory,
    streak: ContinuousFocusStreak,
    thresholds: AnomalyThresholds,
}

impl TimerEngine {
    /// Create an idle engine with empty history.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            state: TimerStateData::default(),
            config,
            history: SessionHistory::new(),
            streak: ContinuousFocusStreak::new(),
            thresholds: AnomalyThresholds::default(),
        }
    }

    /// Rebuild an engine from a persisted snapshot.
    ///
    /// Call [`resume`](Self::resume) afterwards so elapsed time accounts for
    /// the time the process was not running.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: snapshot.timer_state,
            config: snapshot.config,
            history: snapshot.history,
            streak: snapshot.streak,
            thresholds: AnomalyThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: AnomalyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state.current_state
    }

    pub fn data(&self) -> &TimerStateData {
        &self.state
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn streak(&self) -> &ContinuousFocusStreak {
        &self.streak
    }

    pub fn thresholds(&self) -> AnomalyThresholds {
        self.thresholds
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus::project(&self.state, &self.config)
    }

    pub fn available_actions(&self) -> AvailableActions {
        AvailableActions::of(&self.state, &self.config)
    }

    pub fn is_default_time_reached(&self) -> bool {
        is_default_time_reached(&self.state, &self.config)
    }

    pub fn can_switch_state(&self) -> bool {
        can_switch_state(&self.state, &self.config)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            timer_state: self.state.clone(),
            config: self.config.clone(),
            history: self.history.clone(),
            streak: self.streak.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_focus(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.switch_to(TimerState::Focus, "start focus", now)
    }

    pub fn start_reflection(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.switch_to(TimerState::Reflection, "start reflection", now)
    }

    pub fn start_rest(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.switch_to(TimerState::Rest, "start rest", now)
    }

    /// Close the current session and return to Idle.
    ///
    /// Never blocked while a session is open; a no-op when already Idle.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.state.current_state.is_idle() {
            return Vec::new();
        }
        let mut working = self.state.clone();
        let mut events: Vec<Event> = sample(&mut working, now, &self.thresholds)
            .into_iter()
            .collect();
        events.extend(self.close(working, now));
        self.state = TimerStateData::default();
        tracing::debug!("timer cancelled");
        events.push(self.state_changed(now));
        events
    }

    /// Call periodically. Recomputes elapsed time from the clock sample and
    /// reports the new status.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.state.current_state.is_idle() {
            return Vec::new();
        }
        let was_reached = self.is_default_time_reached();
        let mut events: Vec<Event> = sample(&mut self.state, now, &self.thresholds)
            .into_iter()
            .collect();
        events.push(self.state_changed(now));
        events.extend(self.reached_event(was_reached, now));
        events
    }

    /// Recompute elapsed time after a reload.
    ///
    /// Elapsed time is derived from the persisted `start_time`, so time that
    /// passed while the process was not running is counted. The gap since
    /// the last sample is not treated as a clock jump, except when the clock
    /// now reads earlier than the session start.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let Some(start) = self.state.start_time else {
            return vec![self.state_changed(now)];
        };
        let was_reached = self.is_default_time_reached();
        if now >= start {
            self.state.elapsed_ms = self.state.elapsed_ms.max(millis_between(start, now));
        } else {
            tracing::warn!(
                start = %start,
                now = %now,
                "clock reads earlier than session start, keeping persisted elapsed time"
            );
            self.state.start_time = Some(rebase(now, self.state.elapsed_ms));
            self.state.was_interrupted = true;
        }
        self.state.last_sample_time = Some(now);
        tracing::debug!(
            state = %self.state.current_state,
            elapsed_ms = self.state.elapsed_ms,
            "timer resumed"
        );

        let mut events = vec![self.state_changed(now)];
        events.extend(self.reached_event(was_reached, now));
        events
    }

    /// Attach a note to the open Reflection session, or to the most recently
    /// closed record if it is a Reflection record.
    pub fn attach_reflection_summary(&mut self, content: &str, now: DateTime<Utc>) -> Result<()> {
        if content.trim().is_empty() {
            return Err(CoreError::EmptyReflection);
        }
        let slot = if self.state.current_state == TimerState::Reflection {
            &mut self.state.reflection_summary
        } else {
            &mut self
                .history
                .last_reflection_mut()
                .ok_or(CoreError::NoReflectionTarget)?
                .reflection_summary
        };
        slot.get_or_insert_with(|| ReflectionSummary::new(content.to_string(), now))
            .revise(content.to_string(), now);
        Ok(())
    }

    /// Replace the configuration. Takes effect immediately; an invalid
    /// config is rejected and the previous one kept.
    pub fn update_config(&mut self, config: TimerConfig, now: DateTime<Utc>) -> Result<Vec<Event>> {
        config.validate()?;
        let was_reached = self.is_default_time_reached();
        self.config = config;
        tracing::debug!(config = ?self.config, "config updated");
        let mut events = vec![self.state_changed(now)];
        events.extend(self.reached_event(was_reached, now));
        Ok(events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn switch_to(
        &mut self,
        target: TimerState,
        action: &'static str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut working = self.state.clone();
        let anomaly = sample(&mut working, now, &self.thresholds);

        let actions = AvailableActions::of(&working, &self.config);
        let allowed = match target {
            TimerState::Focus => actions.can_start_focus,
            TimerState::Reflection => actions.can_switch_to_reflection,
            TimerState::Rest => actions.can_switch_to_rest,
            TimerState::Idle => actions.can_cancel,
        };
        if !allowed {
            return Err(CoreError::InvalidTransition {
                action,
                state: self.state.current_state,
            });
        }

        let mut events: Vec<Event> = anomaly.into_iter().collect();
        if !working.current_state.is_idle() {
            events.extend(self.close(working, now));
        }
        self.state = TimerStateData::open(target, Uuid::new_v4().to_string(), now);
        tracing::debug!(state = %target, "session opened");
        events.push(self.state_changed(now));
        Ok(events)
    }

    /// Turn the open session in `working` into a record, append it and feed
    /// the streak.
    fn close(&mut self, working: TimerStateData, now: DateTime<Utc>) -> Vec<Event> {
        let (Some(session_type), Some(start_time), Some(id)) = (
            working.current_state.session_type(),
            working.start_time,
            working.session_id.clone(),
        ) else {
            return Vec::new();
        };

        let is_failed = session_type == SessionType::Focus
            && !can_switch_state(&working, &self.config);
        let record = SessionRecord {
            id,
            session_type,
            start_time,
            end_time: start_time + millis(working.elapsed_ms),
            duration_ms: working.elapsed_ms,
            is_completed: !is_failed,
            is_failed,
            metadata: Some(SessionMetadata {
                target_duration: self.config.target_minutes(working.current_state).unwrap_or(0),
                was_interrupted: working.was_interrupted,
            }),
            reflection_summary: working.reflection_summary,
        };

        if !self.history.record(record.clone()) {
            return Vec::new();
        }
        let change = self.streak.on_session_closed(&record, now);
        tracing::info!(
            id = %record.id,
            kind = ?record.session_type,
            duration_ms = record.duration_ms,
            failed = record.is_failed,
            "session recorded"
        );
        if change != StreakChange::Unchanged {
            tracing::debug!(?change, streak = self.streak.count, "focus streak updated");
        }
        vec![Event::SessionRecorded {
            record,
            streak: self.streak.count,
        }]
    }

    fn state_changed(&self, now: DateTime<Utc>) -> Event {
        Event::StateChanged {
            status: self.status(),
            at: now,
        }
    }

    fn reached_event(&self, was_reached: bool, now: DateTime<Utc>) -> Option<Event> {
        if was_reached || !self.is_default_time_reached() {
            return None;
        }
        let target_ms = self.config.target_ms(self.state.current_state)?;
        tracing::debug!(state = %self.state.current_state, "default time reached");
        Some(Event::DefaultTimeReached {
            state: self.state.current_state,
            elapsed_ms: self.state.elapsed_ms,
            target_ms,
            at: now,
        })
    }
}

/// Take a clock sample for an open session.
///
/// Within the tolerance band elapsed is `now - start_time`, but never less
/// than before: after a small backward step it holds until the clock
/// catches up. A jump outside the band is excluded instead: elapsed keeps
/// its value and `start_time` moves so that `now - start_time == elapsed`
/// holds again.
fn sample(
    data: &mut TimerStateData,
    now: DateTime<Utc>,
    thresholds: &AnomalyThresholds,
) -> Option<Event> {
    let (Some(start), Some(last)) = (data.start_time, data.last_sample_time) else {
        return None;
    };
    data.last_sample_time = Some(now);

    let jump = thresholds.classify(last, now);
    if jump == TimeJump::Normal {
        data.elapsed_ms = data.elapsed_ms.max(millis_between(start, now));
        return None;
    }

    let delta_ms = (now - last).num_milliseconds();
    tracing::warn!(
        ?jump,
        delta_ms,
        elapsed_ms = data.elapsed_ms,
        "clock jump excluded from session"
    );
    data.start_time = Some(rebase(now, data.elapsed_ms));
    data.was_interrupted = true;
    Some(Event::TimeAnomaly {
        jump,
        delta_ms,
        at: now,
    })
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Milliseconds from `start` to `end`, zero if `end` is earlier.
fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

fn rebase(now: DateTime<Utc>, elapsed_ms: u64) -> DateTime<Utc> {
    now.checked_sub_signed(millis(elapsed_ms)).unwrap_or(now)
}
