//! Integration tests for the availability scheduler
//!
//! These run on tokio's paused clock, so a 60 second countdown completes
//! instantly while every tick still happens in order.

mod common;

use common::{collect, count, Latency, ScriptedProber};
use siteprobe::config::MonitorConfig;
use siteprobe::error::{Error, ErrorCategory};
use siteprobe::probe::ProbeOutcome;
use siteprobe::scheduler::{MonitorEvent, MonitorState, Scheduler, SchedulerError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const TARGET: &str = "https://target.example/";

fn config(interval: u64) -> MonitorConfig {
    MonitorConfig::new(TARGET).with_poll_interval_secs(interval)
}

fn tick(remaining_secs: u64) -> MonitorEvent {
    MonitorEvent::Tick { remaining_secs }
}

fn retry(outcome: ProbeOutcome) -> MonitorEvent {
    MonitorEvent::Retry { outcome }
}

fn alert() -> MonitorEvent {
    MonitorEvent::Alert {
        target_url: TARGET.to_string(),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_then_cancel_emits_single_stopped() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));
    let scheduler = Scheduler::new(config(60), prober.clone());
    let events = scheduler.subscribe();

    let handle = scheduler.start().unwrap();
    assert!(handle.cancel());

    assert_eq!(collect(events).await, vec![MonitorEvent::Stopped]);
    assert_eq!(handle.wait().await, MonitorState::Stopped);
    assert_eq!(prober.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_never_starts() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));
    let scheduler = Scheduler::new(config(0), prober.clone());
    let mut events = scheduler.subscribe();

    let result = scheduler.start();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(prober.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_failures_map_to_exit_codes() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));

    let scheduler = Scheduler::new(config(0), prober.clone());
    let err = Error::from(scheduler.start().unwrap_err());
    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(!err.is_recoverable());
    assert_eq!(err.exit_code(), 2);

    let scheduler = Scheduler::new(config(1), prober);
    let handle = scheduler.start().unwrap();
    let err = Error::from(scheduler.start().unwrap_err());
    assert_eq!(err.category(), ErrorCategory::Scheduler);
    assert!(!err.is_recoverable());
    assert_eq!(err.exit_code(), 1);
    handle.cancel();
}

#[test]
fn test_start_without_runtime_is_recoverable() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));
    let scheduler = Scheduler::new(config(1), prober);

    let err = Error::from(scheduler.start().unwrap_err());
    assert!(matches!(err, Error::Scheduler(SchedulerError::NoRuntime)));
    assert!(err.is_recoverable());
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_every_subscriber_sees_every_event() {
    let prober = Arc::new(ScriptedProber::new([ProbeOutcome::Unavailable, ProbeOutcome::Available]));
    let scheduler = Scheduler::new(config(2), prober);
    let first = scheduler.subscribe();
    let second = scheduler.subscribe();

    let handle = scheduler.start().unwrap();
    let third = handle.subscribe();

    let first = collect(first).await;
    let second = collect(second).await;
    let third = collect(third).await;

    let expected = vec![
        tick(1),
        tick(0),
        MonitorEvent::ProbeStarted,
        retry(ProbeOutcome::Unavailable),
        tick(1),
        tick(0),
        MonitorEvent::ProbeStarted,
        alert(),
    ];
    assert_eq!(first, expected);
    assert_eq!(second, expected);
    assert_eq!(third, expected);
}

// ============================================================================
// Countdown and retries
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_resets_after_each_failure() {
    let prober = Arc::new(ScriptedProber::new([
        ProbeOutcome::Unavailable,
        ProbeOutcome::TimedOut,
    ]));
    let scheduler = Scheduler::new(config(3), prober);
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    let mut seen = Vec::new();
    while seen.iter().filter(|e| matches!(e, MonitorEvent::Retry { .. })).count() < 2 {
        seen.push(events.recv().await.unwrap());
    }

    assert_eq!(
        seen,
        vec![
            tick(2),
            tick(1),
            tick(0),
            MonitorEvent::ProbeStarted,
            retry(ProbeOutcome::Unavailable),
            tick(2),
            tick(1),
            tick(0),
            MonitorEvent::ProbeStarted,
            retry(ProbeOutcome::TimedOut),
        ]
    );
    assert_eq!(handle.state(), MonitorState::Waiting { remaining_secs: 3 });

    handle.cancel();
    assert_eq!(collect(events).await, vec![MonitorEvent::Stopped]);
}

#[tokio::test(start_paused = true)]
async fn test_one_minute_interval_against_unavailable_target() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Unavailable));
    let scheduler = Scheduler::new(config(60), prober.clone());
    let mut events = scheduler.subscribe();
    let started = Instant::now();
    let handle = scheduler.start().unwrap();

    // First cycle: sixty ticks, one probe, one retry.
    let mut first_cycle = Vec::new();
    loop {
        let event = events.recv().await.unwrap();
        let done = matches!(event, MonitorEvent::Retry { .. });
        first_cycle.push(event);
        if done {
            break;
        }
    }

    assert_eq!(count(&first_cycle, "tick"), 60);
    assert_eq!(count(&first_cycle, "probe_started"), 1);
    assert_eq!(count(&first_cycle, "retry"), 1);
    let ticks: Vec<u64> = first_cycle
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::Tick { remaining_secs } => Some(*remaining_secs),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, (0..60).rev().collect::<Vec<_>>());
    assert_eq!(handle.state(), MonitorState::Waiting { remaining_secs: 60 });

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60), "probed too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(61), "probed too late: {elapsed:?}");

    // Two more cycles.
    let mut all = first_cycle;
    while count(&all, "retry") < 3 {
        all.push(events.recv().await.unwrap());
    }

    assert_eq!(count(&all, "retry"), 3);
    assert_eq!(count(&all, "probe_started"), 3);
    assert_eq!(count(&all, "alert"), 0);
    assert_eq!(count(&all, "tick"), 180);
    assert_eq!(prober.calls(), 3);

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_available_on_third_probe() {
    let prober = Arc::new(ScriptedProber::new([
        ProbeOutcome::Unavailable,
        ProbeOutcome::Unavailable,
        ProbeOutcome::Available,
    ]));
    let scheduler = Scheduler::new(config(60), prober.clone());
    let events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    let all = collect(events).await;

    assert_eq!(count(&all, "probe_started"), 3);
    assert_eq!(count(&all, "retry"), 2);
    assert_eq!(count(&all, "alert"), 1);
    assert_eq!(all.last(), Some(&alert()));

    // Each probe is followed directly by its outcome event.
    let outcomes: Vec<&MonitorEvent> = all
        .windows(2)
        .filter(|w| w[0] == MonitorEvent::ProbeStarted)
        .map(|w| &w[1])
        .collect();
    assert_eq!(
        outcomes,
        vec![
            &retry(ProbeOutcome::Unavailable),
            &retry(ProbeOutcome::Unavailable),
            &alert(),
        ]
    );

    let state = handle.wait().await;
    assert_eq!(
        state,
        MonitorState::Alerted {
            target_url: TARGET.to_string()
        }
    );
    assert_eq!(prober.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_after_alert_even_on_cancel() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));
    let scheduler = Scheduler::new(config(1), prober.clone());
    let events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    let all = collect(events).await;
    assert_eq!(all, vec![tick(0), MonitorEvent::ProbeStarted, alert()]);
    assert!(handle.wait().await.is_terminal());

    assert!(!handle.cancel());
    assert!(matches!(handle.state(), MonitorState::Alerted { .. }));

    let mut late = handle.subscribe();
    assert!(late.recv().await.is_none());

    // No further probes once alerted.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(prober.calls(), 1);
}

// ============================================================================
// Probe concurrency and deadlines
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_suspended_while_probing() {
    let prober = Arc::new(
        ScriptedProber::always(ProbeOutcome::Unavailable)
            .with_latency(Latency::Delay(Duration::from_secs(3))),
    );
    let scheduler = Scheduler::new(config(1), prober.clone());
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    let mut seen = Vec::new();
    while count(&seen, "retry") < 4 {
        seen.push(events.recv().await.unwrap());
    }
    handle.cancel();

    // Between a probe start and its outcome nothing else is emitted.
    for pair in seen.windows(2) {
        if pair[0] == MonitorEvent::ProbeStarted {
            assert!(matches!(pair[1], MonitorEvent::Retry { .. }));
        }
    }
    assert_eq!(prober.max_in_flight(), 1);
    assert_eq!(prober.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_prober_is_bounded_by_timeout() {
    let prober = Arc::new(
        ScriptedProber::always(ProbeOutcome::Available).with_latency(Latency::Hang),
    );
    let scheduler = Scheduler::new(config(1).with_probe_timeout_ms(5000), prober);
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    assert_eq!(events.recv().await, Some(tick(0)));
    assert_eq!(events.recv().await, Some(MonitorEvent::ProbeStarted));
    let probe_started = Instant::now();

    assert_eq!(events.recv().await, Some(retry(ProbeOutcome::TimedOut)));
    let waited = probe_started.elapsed();
    assert!(waited >= Duration::from_secs(5), "gave up too early: {waited:?}");
    assert!(waited <= Duration::from_secs(6), "gave up too late: {waited:?}");

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_abandons_in_flight_probe() {
    let prober = Arc::new(
        ScriptedProber::always(ProbeOutcome::Available).with_latency(Latency::Hang),
    );
    let scheduler = Scheduler::new(config(1).with_probe_timeout_ms(60_000), prober.clone());
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    assert_eq!(events.recv().await, Some(tick(0)));
    assert_eq!(events.recv().await, Some(MonitorEvent::ProbeStarted));
    assert_eq!(handle.state(), MonitorState::Probing);

    let cancelled_at = Instant::now();
    assert!(handle.cancel());

    assert_eq!(events.recv().await, Some(MonitorEvent::Stopped));
    assert_eq!(events.recv().await, None);

    assert_eq!(handle.wait().await, MonitorState::Stopped);
    assert!(cancelled_at.elapsed() < Duration::from_secs(1));
    assert!(handle.is_finished());
    assert_eq!(prober.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_countdown() {
    let prober = Arc::new(ScriptedProber::always(ProbeOutcome::Available));
    let scheduler = Scheduler::new(config(60), prober.clone());
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    for expected in (50..60).rev() {
        assert_eq!(events.recv().await, Some(tick(expected)));
    }

    handle.cancel();
    handle.cancel();

    assert_eq!(collect(events).await, vec![MonitorEvent::Stopped]);
    assert_eq!(handle.wait().await, MonitorState::Stopped);
    assert_eq!(prober.calls(), 0);
}
