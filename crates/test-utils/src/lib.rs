//! Shared fixtures for the `graceful` test suites: recording doubles for
//! the log sink and terminator, configurable fake services, and the two
//! helpers below.

pub mod recording;
pub mod services;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for a single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Directives used when neither `GRACEFUL_TEST_LOG` nor `RUST_LOG` is set.
const DEFAULT_TEST_DIRECTIVES: &str = "graceful=debug,warn";

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness capture, once per
/// binary. Output only shows for failing tests or with `--nocapture`.
///
/// Directives come from `GRACEFUL_TEST_LOG`, then `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = ["GRACEFUL_TEST_LOG", EnvFilter::DEFAULT_ENV]
            .into_iter()
            .find_map(|var| EnvFilter::try_from_env(var).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_TEST_DIRECTIVES));

        // Another subscriber may already be installed by the test itself.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .try_init();
    });
}

/// Await `fut`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(out) => out,
        Err(_) => panic!("test step still pending after {TEST_TIMEOUT:?}"),
    }
}
