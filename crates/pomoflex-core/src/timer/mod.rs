mod anomaly;
mod engine;
mod state;
mod streak;

pub use anomaly::{
    classify, AnomalyThresholds, TimeJump, DEFAULT_BACKWARD_TOLERANCE_MS,
    DEFAULT_FORWARD_TOLERANCE_MS,
};
pub use engine::TimerEngine;
pub use state::{
    can_switch_state, is_default_time_reached, AvailableActions, SessionType, TimerState,
    TimerStateData, TimerStatus,
};
pub use streak::{ContinuousFocusStreak, StreakChange};
