//! Property tests for the timer engine.
//!
//! Random sequences of user actions and clock movements must never break
//! the state invariants or the streak law.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use pomoflex_core::{
    Event, MemoryStore, SessionType, Snapshot, SnapshotStore, TimerConfig, TimerEngine,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    StartFocus,
    StartReflection,
    StartRest,
    Cancel,
    /// Ordinary passage of time, including small backward corrections.
    Advance(i64),
    /// Large clock jump in either direction.
    Jump(i64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::StartFocus),
        1 => Just(Step::StartReflection),
        1 => Just(Step::StartRest),
        1 => Just(Step::Cancel),
        4 => (-60_000i64..=30 * 60_000).prop_map(Step::Advance),
        1 => prop_oneof![
            (-5 * 24 * 3_600_000i64..=-10 * 60_000).prop_map(Step::Jump),
            (49 * 3_600_000i64..=10 * 24 * 3_600_000).prop_map(Step::Jump),
        ],
    ]
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-11T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Length of the trailing run of non-failed Focus records, ignoring other
/// session types.
fn expected_streak(engine: &TimerEngine) -> u32 {
    let mut count = 0;
    for record in engine.history().all().iter().rev() {
        if record.session_type != SessionType::Focus {
            continue;
        }
        if record.is_failed {
            break;
        }
        count += 1;
    }
    count
}

fn apply(engine: &mut TimerEngine, now: &mut DateTime<Utc>, step: &Step) -> Vec<Event> {
    match step {
        Step::StartFocus => engine.start_focus(*now).unwrap_or_default(),
        Step::StartReflection => engine.start_reflection(*now).unwrap_or_default(),
        Step::StartRest => engine.start_rest(*now).unwrap_or_default(),
        Step::Cancel => engine.cancel(*now),
        Step::Advance(ms) | Step::Jump(ms) => {
            *now += Duration::milliseconds(*ms);
            engine.tick(*now)
        }
    }
}

/// Clock movement that stays inside the tolerance band, backward included.
fn drift() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => (-5 * 60_000i64..0).prop_map(Step::Advance),
        3 => (0i64..=10 * 60_000).prop_map(Step::Advance),
    ]
}

proptest! {
    #[test]
    fn state_stays_consistent(steps in proptest::collection::vec(step(), 1..60)) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        for step in &steps {
            apply(&mut engine, &mut now, step);
            prop_assert!(
                engine.data().is_consistent(),
                "after {:?}: {:?}",
                step,
                engine.data()
            );
            prop_assert_eq!(
                engine.data().current_state.is_idle(),
                engine.data().start_time.is_none()
            );
        }
        prop_assert!(engine.history().validate().is_ok());
    }

    #[test]
    fn streak_matches_trailing_successes(steps in proptest::collection::vec(step(), 1..80)) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        for step in &steps {
            apply(&mut engine, &mut now, step);
            prop_assert_eq!(engine.streak().count, expected_streak(&engine));
        }
    }

    #[test]
    fn elapsed_never_decreases_under_drift(
        steps in proptest::collection::vec(drift(), 1..60)
    ) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        engine.start_focus(now).unwrap();
        let mut previous = 0;
        let mut reached = 0;
        for step in &steps {
            let events = apply(&mut engine, &mut now, step);
            prop_assert!(engine.data().elapsed_ms >= previous, "after {:?}", step);
            prop_assert!(!engine.data().was_interrupted);
            previous = engine.data().elapsed_ms;
            reached += events
                .iter()
                .filter(|e| matches!(e, Event::DefaultTimeReached { .. }))
                .count();
        }
        prop_assert!(reached <= 1);
    }

    #[test]
    fn sessions_report_default_time_at_most_once(
        steps in proptest::collection::vec(step(), 1..80)
    ) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        let mut reached: HashMap<String, usize> = HashMap::new();
        let mut last_elapsed: Option<(String, u64)> = None;
        for step in &steps {
            let events = apply(&mut engine, &mut now, step);
            let Some(id) = engine.data().session_id.clone() else {
                last_elapsed = None;
                continue;
            };
            let elapsed = engine.data().elapsed_ms;
            if let Some((previous_id, previous)) = &last_elapsed {
                if *previous_id == id {
                    prop_assert!(elapsed >= *previous, "after {:?}", step);
                }
            }
            last_elapsed = Some((id.clone(), elapsed));

            let count = events
                .iter()
                .filter(|e| matches!(e, Event::DefaultTimeReached { .. }))
                .count();
            let total = reached.entry(id).or_default();
            *total += count;
            prop_assert!(*total <= 1, "after {:?}", step);
        }
    }

    #[test]
    fn jumps_never_change_elapsed(
        before in 0i64..=60 * 60_000,
        jump in prop_oneof![
            -30 * 24 * 3_600_000i64..=-5 * 60_000 - 1,
            48 * 3_600_000i64 + 1..=30 * 24 * 3_600_000,
        ],
    ) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        engine.start_focus(now).unwrap();
        now += Duration::milliseconds(before);
        engine.tick(now);
        let elapsed = engine.data().elapsed_ms;

        now += Duration::milliseconds(jump);
        engine.tick(now);
        prop_assert_eq!(engine.data().elapsed_ms, elapsed);
        prop_assert!(engine.data().was_interrupted);
    }

    #[test]
    fn saved_snapshots_load_back_equal(steps in proptest::collection::vec(step(), 0..40)) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut now = t0();
        for step in &steps {
            apply(&mut engine, &mut now, step);
        }
        let snapshot: Snapshot = engine.snapshot();
        let mut store = SnapshotStore::new(MemoryStore::new());
        store.save(&snapshot).unwrap();
        let outcome = store.load();
        prop_assert!(outcome.recovered.is_empty());
        prop_assert_eq!(outcome.snapshot, snapshot);
    }
}
