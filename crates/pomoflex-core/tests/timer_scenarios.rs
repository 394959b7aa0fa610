//! Integration tests for the timer context.
//!
//! These drive the full stack (context, engine, history, streak, snapshot
//! store) with a manual clock and check the behavior a host observes.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use pomoflex_core::storage::{CONFIG_KEY, HISTORY_KEY, STREAK_KEY, TIMER_STATE_KEY};
use pomoflex_core::{
    Action, AnomalyThresholds, Clock, CoreError, Database, Event, HistoryRange, KeyValueStore,
    ManualClock, MemoryStore, SessionType, Snapshot, SnapshotStore, StorageError, TimerConfig,
    TimerContext, TimerState, TimerStateData,
};

const MIN: i64 = 60 * 1000;

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-11T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn fresh_context() -> TimerContext<MemoryStore, ManualClock> {
    let (ctx, events) = TimerContext::load(
        MemoryStore::new(),
        ManualClock::new(start()),
        AnomalyThresholds::default(),
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::DataRecovered { .. })));
    ctx
}

fn has(events: &[Event], pred: impl Fn(&Event) -> bool) -> bool {
    events.iter().any(pred)
}

#[test]
fn scenario_a_switch_gate_opens_at_failure_time() {
    let mut ctx = fresh_context();
    ctx.dispatch(Action::StartFocus).unwrap();

    ctx.clock().advance_ms(2 * MIN - 1);
    ctx.tick();
    assert!(!ctx.status().available_actions.can_switch_to_reflection);

    ctx.clock().advance_ms(1);
    ctx.tick();
    assert!(ctx.status().available_actions.can_switch_to_reflection);
}

#[test]
fn scenario_b_early_cancel_fails_focus_and_resets_streak() {
    let mut ctx = fresh_context();

    // Build up a streak of one first.
    ctx.dispatch(Action::StartFocus).unwrap();
    ctx.clock().advance_ms(25 * MIN);
    ctx.dispatch(Action::StartRest).unwrap();
    ctx.clock().advance_ms(5 * MIN);
    ctx.dispatch(Action::StartFocus).unwrap();
    assert_eq!(ctx.engine().streak().count, 1);

    ctx.clock().advance_ms(10_000);
    let events = ctx.dispatch(Action::Cancel).unwrap();

    let record = ctx.engine().history().last().unwrap();
    assert_eq!(record.session_type, SessionType::Focus);
    assert!(record.is_failed);
    assert!(!record.is_completed);
    assert_eq!(record.duration_ms, 10_000);
    assert_eq!(ctx.engine().streak().count, 0);
    assert_eq!(ctx.status().current_state, TimerState::Idle);
    assert!(has(&events, |e| matches!(e, Event::SessionRecorded { streak: 0, .. })));
}

#[test]
fn scenario_c_default_time_then_reflection() {
    let mut ctx = fresh_context();
    ctx.dispatch(Action::StartFocus).unwrap();

    ctx.clock().advance_ms(25 * MIN);
    let events = ctx.tick();
    assert!(ctx.status().is_default_time_reached);
    assert!(has(&events, |e| matches!(
        e,
        Event::DefaultTimeReached {
            state: TimerState::Focus,
            ..
        }
    )));

    ctx.dispatch(Action::StartReflection).unwrap();
    let record = ctx.engine().history().last().unwrap();
    assert!(!record.is_failed);
    assert!(record.is_completed);
    assert_eq!(ctx.status().current_state, TimerState::Reflection);
}

#[test]
fn scenario_d_resume_counts_time_while_unloaded() {
    let now = start();
    let mut snapshots = SnapshotStore::new(MemoryStore::new());
    snapshots
        .save(&Snapshot {
            timer_state: TimerStateData {
                current_state: TimerState::Focus,
                start_time: Some(now - Duration::minutes(10)),
                elapsed_ms: 3_000,
                last_sample_time: Some(now - Duration::minutes(9)),
                session_id: Some("persisted".into()),
                was_interrupted: false,
                reflection_summary: None,
            },
            ..Snapshot::default()
        })
        .unwrap();

    let (ctx, events) = TimerContext::load(
        snapshots.into_inner(),
        ManualClock::new(now),
        AnomalyThresholds::default(),
    );
    assert_eq!(ctx.status().elapsed_ms, 600_000);
    assert!(has(&events, |e| matches!(e, Event::StateChanged { .. })));
    assert!(!has(&events, |e| matches!(e, Event::TimeAnomaly { .. })));
}

#[test]
fn scenario_e_corrupted_store_recovers_to_defaults() {
    let mut store = MemoryStore::new();
    for key in [TIMER_STATE_KEY, CONFIG_KEY, HISTORY_KEY, STREAK_KEY] {
        store.set(key, "{{{ definitely not json").unwrap();
    }

    let (ctx, events) =
        TimerContext::load(store, ManualClock::new(start()), AnomalyThresholds::default());

    let recovered = events
        .iter()
        .filter(|e| matches!(e, Event::DataRecovered { .. }))
        .count();
    assert_eq!(recovered, 4);
    assert_eq!(ctx.engine().snapshot(), Snapshot::default());

    // The defaults were written back, so the next load is clean.
    let store = ctx.into_store();
    let outcome = SnapshotStore::new(store).load();
    assert!(outcome.recovered.is_empty());
}

#[test]
fn cancel_when_idle_is_a_noop() {
    let mut ctx = fresh_context();
    let events = ctx.dispatch(Action::Cancel).unwrap();
    assert!(events.is_empty());
    assert!(ctx.engine().history().is_empty());
}

#[test]
fn invalid_transition_leaves_state_untouched() {
    let mut ctx = fresh_context();
    let err = ctx.dispatch(Action::StartRest).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidTransition {
            state: TimerState::Idle,
            ..
        }
    ));
    assert_eq!(ctx.engine().snapshot(), Snapshot::default());
}

#[test]
fn storage_failure_is_reported_not_thrown() {
    let (mut ctx, events) = TimerContext::load(
        MemoryStore::with_quota(8),
        ManualClock::new(start()),
        AnomalyThresholds::default(),
    );
    assert!(has(&events, |e| matches!(e, Event::StorageWriteFailed { .. })));

    let events = ctx.dispatch(Action::StartFocus).unwrap();
    assert_eq!(ctx.status().current_state, TimerState::Focus);
    assert!(has(&events, |e| matches!(e, Event::StorageWriteFailed { .. })));
}

#[test]
fn explicit_save_reports_storage_failure() {
    let (mut ctx, _) = TimerContext::load(
        MemoryStore::with_quota(8),
        ManualClock::new(start()),
        AnomalyThresholds::default(),
    );
    ctx.dispatch(Action::StartFocus).unwrap();

    let err = ctx.save().unwrap_err();
    assert!(matches!(
        err,
        CoreError::StorageWrite(StorageError::QuotaExceeded { .. })
    ));
    assert_eq!(ctx.status().current_state, TimerState::Focus);

    let mut ctx = fresh_context();
    ctx.dispatch(Action::StartFocus).unwrap();
    ctx.save().unwrap();
}

#[test]
fn history_queries_use_the_local_calendar() {
    let local = |d: u32, h: u32| {
        Local
            .with_ymd_and_hms(2026, 3, d, h, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    };
    let earlier_month = Local
        .with_ymd_and_hms(2026, 2, 20, 10, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc);

    let (mut ctx, _) = TimerContext::load(
        MemoryStore::new(),
        ManualClock::new(earlier_month),
        AnomalyThresholds::default(),
    );
    // Wednesday 2026-03-11 is "today"; Monday the 9th shares its ISO week,
    // Sunday the 1st only its month.
    for at in [earlier_month, local(1, 10), local(9, 10), local(11, 9)] {
        ctx.clock().set(at);
        ctx.dispatch(Action::StartFocus).unwrap();
        ctx.clock().advance_ms(25 * MIN);
        ctx.dispatch(Action::Cancel).unwrap();
    }
    ctx.clock().set(local(11, 12));

    let starts = |records: Vec<pomoflex_core::SessionRecord>| {
        records.iter().map(|r| r.start_time).collect::<Vec<_>>()
    };
    assert_eq!(starts(ctx.history_today()), vec![local(11, 9)]);
    assert_eq!(starts(ctx.history_week()), vec![local(9, 10), local(11, 9)]);
    assert_eq!(
        starts(ctx.history_month()),
        vec![local(1, 10), local(9, 10), local(11, 9)]
    );
    assert_eq!(ctx.history(HistoryRange::All).len(), 4);
    assert_eq!(ctx.stats(HistoryRange::Week).completed_focus, 2);
}

#[test]
fn rejected_config_keeps_previous() {
    let mut ctx = fresh_context();
    let bad = TimerConfig {
        focus_duration: 5,
        focus_failure_time: 6,
        ..TimerConfig::default()
    };
    assert!(matches!(
        ctx.dispatch(Action::UpdateConfig { config: bad }),
        Err(CoreError::Config(_))
    ));
    assert_eq!(ctx.engine().config(), &TimerConfig::default());
}

#[test]
fn reflection_summary_survives_reload() {
    let mut ctx = fresh_context();
    ctx.dispatch(Action::StartFocus).unwrap();
    ctx.clock().advance_ms(25 * MIN);
    ctx.dispatch(Action::StartReflection).unwrap();
    ctx.dispatch(Action::AttachReflectionSummary {
        content: "finished the parser".into(),
    })
    .unwrap();

    let now = ctx.clock().now();
    let (mut reloaded, _) = TimerContext::load(
        ctx.into_store(),
        ManualClock::new(now + Duration::minutes(3)),
        AnomalyThresholds::default(),
    );
    reloaded.dispatch(Action::StartRest).unwrap();
    let record = reloaded.engine().history().last().unwrap();
    assert_eq!(record.session_type, SessionType::Reflection);
    assert_eq!(
        record.reflection_summary.as_ref().unwrap().content,
        "finished the parser"
    );
    assert_eq!(record.duration_ms, 3 * 60_000);
}

#[test]
fn sqlite_store_round_trips_a_day() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pomoflex.db");

    let snapshot = {
        let (mut ctx, _) = TimerContext::load(
            Database::open_at(&path).unwrap(),
            ManualClock::new(start()),
            AnomalyThresholds::default(),
        );
        ctx.dispatch(Action::StartFocus).unwrap();
        ctx.clock().advance_ms(30 * MIN);
        ctx.dispatch(Action::StartReflection).unwrap();
        ctx.clock().advance_ms(5 * MIN);
        ctx.dispatch(Action::StartRest).unwrap();
        ctx.clock().advance_ms(MIN);
        ctx.tick();
        ctx.engine().snapshot()
    };

    let outcome = SnapshotStore::new(Database::open_at(&path).unwrap()).load();
    assert!(outcome.recovered.is_empty());
    assert_eq!(outcome.snapshot, snapshot);
    assert_eq!(outcome.snapshot.history.len(), 2);
    assert_eq!(outcome.snapshot.streak.count, 1);
}
