//! The timer context: engine + persistence + clock.
//!
//! Lifecycle contract:
//! - construct with [`TimerContext::load`], which restores the last snapshot
//!   (recovering from corruption) and resumes the open session;
//! - every state-affecting call saves the snapshot before returning;
//! - there is no teardown, dropping the context is always safe.
//!
//! A failed save never fails the operation. It is logged and reported as
//! [`Event::StorageWriteFailed`]; the in-memory state stays authoritative
//! and the next successful save catches the store up.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::TimerConfig;
use crate::error::Result;
use crate::events::Event;
use crate::history::{HistoryRange, HistoryStats, SessionRecord};
use crate::storage::{KeyValueStore, SnapshotStore};
use crate::timer::{AnomalyThresholds, TimerEngine, TimerStatus};

/// User-initiated operations accepted by [`TimerContext::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    StartFocus,
    StartReflection,
    StartRest,
    Cancel,
    AttachReflectionSummary { content: String },
    UpdateConfig { config: TimerConfig },
}

pub struct TimerContext<S, C> {
    engine: TimerEngine,
    store: SnapshotStore<S>,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> TimerContext<S, C> {
    /// Restore from `store` and resume at the clock's current time.
    ///
    /// Returns the context together with the load events: one
    /// `DataRecovered` per replaced document, then the resume events.
    pub fn load(store: S, clock: C, thresholds: AnomalyThresholds) -> (Self, Vec<Event>) {
        let store = SnapshotStore::new(store);
        let outcome = store.load();
        let now = clock.now();

        let mut events: Vec<Event> = outcome
            .recovered
            .into_iter()
            .map(|r| Event::DataRecovered {
                key: r.key,
                reason: r.reason,
                at: now,
            })
            .collect();
        if outcome.fresh {
            tracing::info!("no saved timer data, starting fresh");
        }

        let mut engine = TimerEngine::from_snapshot(outcome.snapshot).with_thresholds(thresholds);
        events.extend(engine.resume(now));

        let mut context = Self {
            engine,
            store,
            clock,
        };
        events.extend(context.persist(now));
        (context, events)
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Event>> {
        let now = self.clock.now();
        tracing::debug!(?action, "dispatch");
        let mut events = match action {
            Action::StartFocus => self.engine.start_focus(now)?,
            Action::StartReflection => self.engine.start_reflection(now)?,
            Action::StartRest => self.engine.start_rest(now)?,
            Action::Cancel => {
                let events = self.engine.cancel(now);
                if events.is_empty() {
                    return Ok(events);
                }
                events
            }
            Action::AttachReflectionSummary { content } => {
                self.engine.attach_reflection_summary(&content, now)?;
                Vec::new()
            }
            Action::UpdateConfig { config } => self.engine.update_config(config, now)?,
        };
        events.extend(self.persist(now));
        Ok(events)
    }

    /// Called by the host scheduler on its interval.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = self.engine.tick(now);
        if !events.is_empty() {
            events.extend(self.persist(now));
        }
        events
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        self.store.store()
    }

    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    /// Records in `range`, using the local calendar.
    pub fn history(&self, range: HistoryRange) -> Vec<SessionRecord> {
        self.engine
            .history()
            .range(range, &self.local_now())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn history_today(&self) -> Vec<SessionRecord> {
        self.history(HistoryRange::Today)
    }

    pub fn history_week(&self) -> Vec<SessionRecord> {
        self.history(HistoryRange::Week)
    }

    pub fn history_month(&self) -> Vec<SessionRecord> {
        self.history(HistoryRange::Month)
    }

    pub fn stats(&self, range: HistoryRange) -> HistoryStats {
        self.engine.history().stats(range, &self.local_now())
    }

    fn local_now(&self) -> DateTime<Local> {
        self.clock.now().with_timezone(&Local)
    }

    /// Write the current snapshot now.
    ///
    /// Hosts call this before exiting to learn whether the last state
    /// reached the store; routine operations already save on their own.
    ///
    /// # Errors
    /// Returns `CoreError::StorageWrite` if any document could not be written.
    pub fn save(&mut self) -> Result<()> {
        self.store.save(&self.engine.snapshot())?;
        Ok(())
    }

    fn persist(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.save() {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save timer snapshot");
                Some(Event::StorageWriteFailed {
                    message: e.to_string(),
                    at: now,
                })
            }
        }
    }
}
