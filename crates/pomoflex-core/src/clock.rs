//! Wall-clock sources.
//!
//! The engine itself never reads the system time: every operation takes an
//! explicit `now`. The [`TimerContext`](crate::TimerContext) samples one of
//! these clocks on behalf of its host.

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Used by tests and simulations to reproduce sleep/wake and clock jumps.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock by `delta`, which may be negative.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.advance(Duration::milliseconds(ms));
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
