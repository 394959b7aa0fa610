//! # Pomoflex Core Library
//!
//! This library provides the timer state engine for Pomoflex, a flexible
//! Pomodoro timer with a Focus / Reflection / Rest cycle. It is embedded by
//! a host (the CLI, or any UI) which forwards user actions and drives ticks.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. It never reads the
//!   clock itself; the caller passes `now` and invokes `tick()` periodically
//! - **Anomaly detection**: Clock jumps (sleep/wake, manual changes) outside
//!   a tolerance band are excluded from elapsed time instead of resetting it
//! - **History**: Append-only log of closed sessions with calendar queries
//! - **Streak**: Count of consecutive completed Focus sessions
//! - **Storage**: JSON snapshot documents over a key-value store (SQLite or
//!   in-memory), recovering to defaults on corruption
//!
//! ## Key Components
//!
//! - [`TimerContext`]: Engine + store + clock, the object hosts hold
//! - [`TimerEngine`]: Core timer state machine
//! - [`SnapshotStore`]: Snapshot persistence
//! - [`Event`]: Outbound notifications

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod history;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TimerConfig;
pub use context::{Action, TimerContext};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use history::{
    HistoryRange, HistoryStats, ReflectionSummary, SessionHistory, SessionMetadata, SessionRecord,
};
pub use storage::{Database, KeyValueStore, MemoryStore, Settings, Snapshot, SnapshotStore};
pub use timer::{
    AnomalyThresholds, AvailableActions, ContinuousFocusStreak, SessionType, TimeJump,
    TimerEngine, TimerState, TimerStateData, TimerStatus,
};
