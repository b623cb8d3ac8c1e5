// tests/graceful_cycle.rs

mod common;
use crate::common::{init_tracing, with_timeout, Harness, ServiceBuilder};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graceful::{
    CleanupReport, CycleOutcome, FailureSeverity, Shutdown, TerminationCause, WorkloadExit,
};
use graceful_test_utils::recording::Level;

#[tokio::test(flavor = "multi_thread")]
async fn workload_finishing_first_skips_cleanup() {
    init_tracing();
    let h = Harness::new();
    let svc = ServiceBuilder::new().build();

    let shutdown = Shutdown::new(h.options().timeout(Duration::from_secs(1)))
        .register_closable(svc.closable());

    let outcome = with_timeout(shutdown.process(async {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }))
    .await;

    assert_eq!(outcome, CycleOutcome::CompletedNormally(WorkloadExit::Returned));
    assert_eq!(svc.close_calls(), 0);
    assert!(!h.sink.contains(Level::Info, "shutdown initiated"));
    assert_eq!(h.terminator.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_runs_every_callback_once_despite_failures() {
    init_tracing();
    let h = Harness::new();
    let slow = ServiceBuilder::new().delay(Duration::from_millis(10)).build();
    let broken = ServiceBuilder::new().failing().build();

    let shutdown = Shutdown::new(h.options().timeout(Duration::from_secs(1)))
        .register_closable(broken.closable())
        .register_closable(slow.closable());

    h.cancel_after(Duration::from_millis(30));
    let outcome = with_timeout(shutdown.process(async {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }))
    .await;

    assert_eq!(
        outcome,
        CycleOutcome::Done {
            cause: TerminationCause::Cancelled,
            report: CleanupReport { total: 2, failed: 1 },
        }
    );
    assert!(slow.is_closed());
    assert!(broken.is_closed());
    assert_eq!(slow.close_calls(), 1);
    assert_eq!(broken.close_calls(), 1);
    assert_eq!(h.terminator.calls(), 0);

    assert!(h.sink.contains(Level::Info, "shutdown initiated"));
    assert!(h.sink.contains(Level::Warn, "service could not be closed"));
    assert!(h.sink.contains(Level::Info, "shutdown complete"));
}

#[tokio::test(flavor = "multi_thread")]
async fn pre_cancelled_token_never_completes_workload() {
    init_tracing();
    let h = Harness::new();
    h.token.cancel();

    let completed = Arc::new(AtomicBool::new(false));
    let flag = completed.clone();
    let svc = ServiceBuilder::new().build();
    let shutdown = Shutdown::new(h.options()).register_closable(svc.closable());

    let outcome = with_timeout(shutdown.process(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        flag.store(true, Ordering::SeqCst);
    }))
    .await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Done {
            cause: TerminationCause::Cancelled,
            ..
        }
    ));
    assert!(!completed.load(Ordering::SeqCst));
    assert!(svc.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn parent_token_cancellation_reaches_child() {
    init_tracing();
    let h = Harness::new();
    let parent = graceful::CancellationToken::new();
    let shutdown = Shutdown::new(h.options().token(parent.child_token()));

    let trigger = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome = with_timeout(shutdown.wait()).await;
    assert_eq!(
        outcome,
        CycleOutcome::Done {
            cause: TerminationCause::Cancelled,
            report: CleanupReport::default(),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn watchdog_terminates_when_cleanup_overruns() {
    init_tracing();
    let h = Harness::new();
    let stuck = ServiceBuilder::new().delay(Duration::from_secs(3)).build();
    let quick = ServiceBuilder::new().build();

    let shutdown = Shutdown::new(h.options().timeout(Duration::from_millis(30)))
        .register_closable(stuck.closable())
        .register_closable(quick.closable());

    h.token.cancel();
    let outcome = with_timeout(shutdown.wait()).await;

    assert_eq!(
        outcome,
        CycleOutcome::ForceTerminated {
            cause: TerminationCause::Cancelled
        }
    );
    assert_eq!(h.terminator.calls(), 1);
    assert_eq!(h.terminator.last_code(), 1);
    assert!(h.sink.contains(Level::Fatal, "forcing exit"));
    assert!(!h.sink.contains(Level::Info, "shutdown complete"));
    assert!(quick.is_closed());

    // The stuck callback was abandoned mid-flight.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!stuck.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_within_timeout_is_not_killed() {
    init_tracing();
    let h = Harness::new();
    let svc = ServiceBuilder::new().delay(Duration::from_millis(20)).build();
    let shutdown = Shutdown::new(h.options().timeout(Duration::from_millis(500)))
        .register_closable(svc.closable());

    h.token.cancel();
    let outcome = with_timeout(shutdown.wait()).await;
    assert!(matches!(outcome, CycleOutcome::Done { .. }));

    // Past the original deadline: the disarmed watchdog stays silent.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(h.terminator.calls(), 0);
    assert_eq!(h.sink.count(Level::Fatal), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_callbacks_complete_immediately() {
    init_tracing();
    let h = Harness::new();
    let shutdown = Shutdown::new(h.options().timeout(Duration::from_millis(50)));

    h.token.cancel();
    let outcome = with_timeout(shutdown.wait()).await;
    assert_eq!(
        outcome,
        CycleOutcome::Done {
            cause: TerminationCause::Cancelled,
            report: CleanupReport::default(),
        }
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.terminator.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn fatal_severity_still_runs_siblings_then_terminates() {
    init_tracing();
    let h = Harness::new();
    let broken = ServiceBuilder::new().failing().build();
    let slow = ServiceBuilder::new().delay(Duration::from_millis(30)).build();

    let shutdown = Shutdown::new(h.options().failure_severity(FailureSeverity::Fatal))
        .register_closable(broken.closable())
        .register_closable(slow.closable());

    h.token.cancel();
    let outcome = with_timeout(shutdown.wait()).await;

    assert!(matches!(outcome, CycleOutcome::Done { report, .. } if report.failed == 1));
    assert!(slow.is_closed());
    assert!(h.sink.contains(Level::Fatal, "service could not be closed"));
    assert_eq!(h.terminator.calls(), 1);
}

async fn explode() {
    panic!("primary workload exploded");
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_workload_still_completes_the_cycle() {
    init_tracing();
    let h = Harness::new();
    let svc = ServiceBuilder::new().build();
    let shutdown = Shutdown::new(h.options()).register_closable(svc.closable());

    let outcome = with_timeout(shutdown.process(explode())).await;

    assert_eq!(
        outcome,
        CycleOutcome::CompletedNormally(WorkloadExit::Panicked(
            "primary workload exploded".to_string()
        ))
    );
    assert!(h.sink.contains(Level::Warn, "primary workload panicked"));
    assert_eq!(svc.close_calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn each_cycle_invokes_callbacks_again() {
    init_tracing();
    let h = Harness::new();
    let svc = ServiceBuilder::new().build();
    let shutdown = Shutdown::new(h.options()).register_closable(svc.closable());

    h.token.cancel();
    with_timeout(shutdown.wait()).await;
    with_timeout(shutdown.wait()).await;

    assert_eq!(svc.close_calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn workload_keeps_running_after_termination() {
    init_tracing();
    let h = Harness::new();
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    let shutdown = Shutdown::new(h.options());

    h.cancel_after(Duration::from_millis(10));
    let outcome = with_timeout(shutdown.process(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        flag.store(true, Ordering::SeqCst);
    }))
    .await;

    assert!(matches!(outcome, CycleOutcome::Done { .. }));
    assert!(!finished.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(finished.load(Ordering::SeqCst));
}

// Default `#[tokio::test]` runtime: one thread, which the callback blocks.
#[tokio::test]
async fn watchdog_fires_while_a_callback_blocks_the_runtime() {
    init_tracing();
    let h = Harness::new();
    let blocker = graceful::closable(|| async {
        std::thread::sleep(Duration::from_millis(500));
        Ok::<(), anyhow::Error>(())
    });
    let shutdown = Shutdown::new(h.options().timeout(Duration::from_millis(20)))
        .register_closable(blocker);

    h.token.cancel();
    let started = std::time::Instant::now();
    let outcome = with_timeout(shutdown.wait()).await;

    assert_eq!(
        outcome,
        CycleOutcome::ForceTerminated {
            cause: TerminationCause::Cancelled
        }
    );
    assert_eq!(h.terminator.calls(), 1);
    let fired_after = h
        .terminator
        .first_call_at()
        .expect("terminator should have been called")
        .duration_since(started);
    assert!(
        fired_after < Duration::from_millis(300),
        "watchdog fired after {fired_after:?}"
    );
    assert!(h.sink.contains(Level::Fatal, "forcing exit"));
}
