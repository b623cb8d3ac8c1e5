// tests/signal_delivery.rs
//
// Kept to a single test: the signal goes to the whole test process, so
// nothing else in this binary may be listening for it.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout, ServiceBuilder};

use std::process::Stdio;
use std::time::Duration;

use graceful::{CycleOutcome, Shutdown, ShutdownOptions, SignalName, TerminationCause};
use graceful_test_utils::recording::{Level, RecordingSink, RecordingTerminator};

#[tokio::test(flavor = "multi_thread")]
async fn signal_triggers_cleanup_of_every_service() {
    init_tracing();
    let sink = RecordingSink::new();
    let terminator = RecordingTerminator::new();
    let db = ServiceBuilder::new().delay(Duration::from_millis(10)).build();
    let cache = ServiceBuilder::new().failing().build();

    let options = ShutdownOptions::new()
        .signals([SignalName::User1])
        .timeout(Duration::from_secs(1))
        .log_sink(sink.clone())
        .terminator(terminator.clone());
    let shutdown = Shutdown::new(options)
        .register_closable(db.closable())
        .register_closable(cache.closable());

    // Keeps signalling for the whole cycle; extra deliveries must not
    // start a second cleanup round.
    let pid = std::process::id().to_string();
    let emitter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        loop {
            let _ = tokio::process::Command::new("kill")
                .args(["-USR1", &pid])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let outcome = with_timeout(shutdown.process(async {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }))
    .await;
    emitter.abort();

    match outcome {
        CycleOutcome::Done { cause, report } => {
            assert_eq!(cause, TerminationCause::Signal(SignalName::User1));
            assert_eq!(report.total, 2);
            assert_eq!(report.failed, 1);
        }
        other => panic!("expected Done, got {other:?}"),
    }
    assert!(db.is_closed());
    assert!(cache.is_closed());
    assert_eq!(db.close_calls(), 1);
    assert_eq!(cache.close_calls(), 1);
    assert_eq!(terminator.calls(), 0);
    assert_eq!(sink.count(Level::Fatal), 0);
    assert!(sink.contains(Level::Info, "shutdown initiated (received SIGUSR1)"));
}
