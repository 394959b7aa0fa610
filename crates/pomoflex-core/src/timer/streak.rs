//! Continuous focus streak.
//!
//! Counts consecutive successfully completed Focus sessions. A failed Focus
//! session resets the count; Reflection and Rest sessions do not touch it.
//! The tracker is driven only by the engine and never reads the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::SessionRecord;
use crate::timer::SessionType;

/// How a closed session changed the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Extended,
    Reset,
    /// Not a Focus session, a replay of the last counted one, or a failure
    /// with no streak to lose.
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousFocusStreak {
    pub count: u32,
    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,
    /// Id of the last counted session; guards against double counting when
    /// the same record is delivered twice.
    #[serde(default)]
    pub last_session_id: Option<String>,
}

impl ContinuousFocusStreak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a closed session. Returns how the count changed.
    pub fn on_session_closed(
        &mut self,
        record: &SessionRecord,
        now: DateTime<Utc>,
    ) -> StreakChange {
        if record.session_type != SessionType::Focus {
            return StreakChange::Unchanged;
        }

        if record.is_failed {
            if self.count == 0 {
                return StreakChange::Unchanged;
            }
            tracing::info!(previous = self.count, id = %record.id, "focus streak reset");
            self.count = 0;
            self.last_update_time = Some(now);
            return StreakChange::Reset;
        }

        if self.last_session_id.as_deref() == Some(record.id.as_str()) {
            return StreakChange::Unchanged;
        }

        self.count = self.count.saturating_add(1);
        self.last_session_id = Some(record.id.clone());
        self.last_update_time = Some(now);
        StreakChange::Extended
    }
}
