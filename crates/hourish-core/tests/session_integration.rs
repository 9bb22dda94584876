//! Integration tests for running a plan through the session runner.

use std::time::Duration;

use hourish_core::{
    CountdownScheduler, ManualClock, Plan, SchedulerError, SessionConfig, SessionEvent,
    SessionPhase, SessionRunner, StopReason,
};

const PLAN: &str = r#"
name = "Sprint"

[[tasks]]
title = "Warm up"
duration_secs = 2

[[tasks]]
title = "Deep work"
note = "no chat"
duration_secs = 3
locked = true

[[tasks]]
title = "Wrap up"
duration_secs = 1
"#;

#[tokio::test(start_paused = true)]
async fn test_plan_runs_to_completion() {
    let plan = Plan::from_toml_str(PLAN).unwrap();
    let config = SessionConfig {
        tick_interval_ms: 50,
        grace_delay_ms: 200,
    };
    let runner = SessionRunner::new(&config).unwrap();
    let mut events = runner.events();

    runner.populate(&plan.task_records()).unwrap();
    runner.start().unwrap();
    assert_eq!(runner.snapshot().total_remaining_ms, 6_000);

    let mut rx = runner.subscribe();
    let mut activations = Vec::new();
    loop {
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        let sum: u64 = snap.items.iter().map(|i| i.remaining_ms).sum();
        if snap.active {
            assert_eq!(snap.total_remaining_ms, sum);
        }
        if let Some(item) = snap.active_item() {
            if activations.last() != Some(&item.title) {
                activations.push(item.title.clone());
            }
        }
        if !snap.active {
            break;
        }
    }

    assert_eq!(activations, ["Warm up", "Deep work", "Wrap up"]);
    let snap = runner.snapshot();
    assert_eq!(snap.phase, SessionPhase::Idle);
    assert!(snap.items.iter().all(|i| i.is_complete() && !i.is_active));
    assert!(snap.items[1].locked);

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(SessionEvent::SessionStopped { reason: StopReason::Completed, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_manual_stop() {
    let plan = Plan::from_toml_str(PLAN).unwrap();
    let runner = SessionRunner::new(&SessionConfig::default()).unwrap();
    runner.populate(&plan.task_records()).unwrap();
    runner.start().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    runner.stop();

    // Fresh records reset the countdown.
    runner.populate(&plan.task_records()).unwrap();
    runner.start().unwrap();
    let snap = runner.snapshot();
    assert_eq!(snap.active_item().unwrap().remaining_ms, 2_000);
    assert_eq!(snap.total_remaining_ms, 6_000);
    runner.stop();
}

#[test]
fn test_plan_with_clashing_orders_is_rejected() {
    let plan = Plan::from_toml_str(
        r#"
name = "Clash"

[[tasks]]
title = "one"
duration_secs = 1
order = 1

[[tasks]]
title = "two"
duration_secs = 1
"#,
    )
    .unwrap();

    let mut scheduler = CountdownScheduler::new(ManualClock::new(0));
    let err = scheduler.populate(&plan.task_records()).unwrap_err();
    assert!(matches!(err, SchedulerError::DuplicateOrder { order: 1, .. }));
    assert_eq!(scheduler.start(), Err(SchedulerError::EmptySchedule));
}
