use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::SessionRecord;
use crate::timer::{TimeJump, TimerState, TimerStatus};

/// Outbound notifications for the host UI.
///
/// Every engine operation returns the events it produced, in order.
/// Hosts render `StateChanged`, ring a bell on `DefaultTimeReached`, and
/// show a notice for `DataRecovered` / `StorageWriteFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateChanged {
        status: TimerStatus,
        at: DateTime<Utc>,
    },
    /// `is_default_time_reached` went from false to true.
    DefaultTimeReached {
        state: TimerState,
        elapsed_ms: u64,
        target_ms: u64,
        at: DateTime<Utc>,
    },
    /// A session closed and was appended to history.
    SessionRecorded {
        record: SessionRecord,
        streak: u32,
    },
    /// A clock jump was detected and excluded from elapsed time.
    TimeAnomaly {
        jump: TimeJump,
        delta_ms: i64,
        at: DateTime<Utc>,
    },
    /// A persisted document was unreadable and replaced by its default.
    DataRecovered {
        key: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// Saving the snapshot failed; in-memory state is still authoritative.
    StorageWriteFailed {
        message: String,
        at: DateTime<Utc>,
    },
}
