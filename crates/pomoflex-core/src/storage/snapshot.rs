//! Snapshot codec over a [`KeyValueStore`].
//!
//! The snapshot is split into four JSON documents under stable keys. Each is
//! read and validated on its own: a bad document is replaced by its default
//! and reported, the others are kept. Loading never fails.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::kv::KeyValueStore;
use crate::config::TimerConfig;
use crate::error::{CoreError, StorageError};
use crate::history::SessionHistory;
use crate::timer::{ContinuousFocusStreak, TimerStateData};

pub const TIMER_STATE_KEY: &str = "timer_state";
pub const CONFIG_KEY: &str = "timer_config";
pub const HISTORY_KEY: &str = "session_history";
pub const STREAK_KEY: &str = "focus_streak";

const KEYS: [&str; 4] = [TIMER_STATE_KEY, CONFIG_KEY, HISTORY_KEY, STREAK_KEY];

/// Everything the engine persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timer_state: TimerStateData,
    pub config: TimerConfig,
    pub history: SessionHistory,
    pub streak: ContinuousFocusStreak,
}

/// A document that was replaced by its default during load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recovery {
    pub key: String,
    pub reason: String,
}

impl From<Recovery> for CoreError {
    fn from(r: Recovery) -> Self {
        CoreError::StorageReadCorruption {
            key: r.key,
            reason: r.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub snapshot: Snapshot,
    /// Empty unless some document had to be replaced.
    pub recovered: Vec<Recovery>,
    /// No document existed at all.
    pub fresh: bool,
}

impl LoadOutcome {
    /// Fail on the first recovery instead of accepting defaults.
    ///
    /// # Errors
    /// Returns `CoreError::StorageReadCorruption` for the first bad document.
    pub fn strict(self) -> Result<Snapshot, CoreError> {
        match self.recovered.into_iter().next() {
            Some(recovery) => Err(recovery.into()),
            None => Ok(self.snapshot),
        }
    }
}

pub struct SnapshotStore<S> {
    store: S,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write all four documents.
    ///
    /// Stops at the first failed write; documents already written stay
    /// written.
    ///
    /// # Errors
    /// Returns the serialization or store error of the failed document.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.write(TIMER_STATE_KEY, &snapshot.timer_state)?;
        self.write(CONFIG_KEY, &snapshot.config)?;
        self.write(HISTORY_KEY, &snapshot.history)?;
        self.write(STREAK_KEY, &snapshot.streak)?;
        Ok(())
    }

    pub fn load(&self) -> LoadOutcome {
        let fresh = KEYS
            .iter()
            .all(|key| matches!(self.store.get(key), Ok(None)));
        let mut recovered = Vec::new();

        let snapshot = Snapshot {
            timer_state: self.read(TIMER_STATE_KEY, fresh, &mut recovered, |s: &TimerStateData| {
                if s.is_consistent() {
                    Ok(())
                } else {
                    Err(format!(
                        "inconsistent timer state (state {}, start time {})",
                        s.current_state,
                        if s.start_time.is_some() { "present" } else { "absent" }
                    ))
                }
            }),
            config: self.read(CONFIG_KEY, fresh, &mut recovered, |c: &TimerConfig| {
                c.validate().map_err(|e| e.to_string())
            }),
            history: self.read(HISTORY_KEY, fresh, &mut recovered, SessionHistory::validate),
            streak: self.read(STREAK_KEY, fresh, &mut recovered, |_: &ContinuousFocusStreak| {
                Ok(())
            }),
        };

        LoadOutcome {
            snapshot,
            recovered,
            fresh,
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(key, &json)
    }

    fn read<T>(
        &self,
        key: &str,
        fresh: bool,
        recovered: &mut Vec<Recovery>,
        check: impl Fn(&T) -> Result<(), String>,
    ) -> T
    where
        T: DeserializeOwned + Default,
    {
        let reason = match self.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => match check(&value) {
                    Ok(()) => return value,
                    Err(reason) => reason,
                },
                Err(e) => format!("malformed JSON: {e}"),
            },
            Ok(None) if fresh => return T::default(),
            Ok(None) => "document missing".to_string(),
            Err(e) => format!("unreadable: {e}"),
        };
        tracing::warn!(key, %reason, "replacing persisted document with default");
        recovered.push(Recovery {
            key: key.to_string(),
            reason,
        });
        T::default()
    }
}
