// src/shutdown.rs

//! Public entry point: [`Shutdown`].
//!
//! ```no_run
//! use std::time::Duration;
//! use graceful::{Shutdown, ShutdownOptions};
//!
//! # async fn serve() {}
//! # async fn example() {
//! let shutdown = Shutdown::new(ShutdownOptions::new().timeout(Duration::from_secs(5)))
//!     .register(|| async {
//!         // flush buffers, close connections, ...
//!         Ok::<(), anyhow::Error>(())
//!     });
//!
//! shutdown.process(serve()).await;
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::{EffectiveConfig, ShutdownOptions};
use crate::engine::{CycleOutcome, CycleRuntime};
use crate::exec::{Closable, closable};
use crate::types::SignalName;

/// Cleanup timeout used by [`Shutdown::with_signals`].
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(10);

/// Graceful shutdown orchestrator.
///
/// Holds the resolved configuration and the registered cleanup callbacks.
/// Each call to [`Shutdown::run_graceful`] runs one independent cycle;
/// overlapping cycles on the same instance are not coordinated.
pub struct Shutdown {
    config: EffectiveConfig,
    callbacks: Vec<Closable>,
}

impl Shutdown {
    /// Build from resolved options. The cleanup phase is unbounded unless
    /// the options set a timeout.
    pub fn new(options: ShutdownOptions) -> Self {
        Self {
            config: options.resolve(),
            callbacks: Vec::new(),
        }
    }

    /// Listen for exactly `signals` (defaults when empty) with a cleanup
    /// timeout of [`DEFAULT_EXPIRATION`].
    pub fn with_signals<I>(signals: I) -> Self
    where
        I: IntoIterator<Item = SignalName>,
    {
        Self::new(
            ShutdownOptions::new()
                .signals(signals)
                .timeout(DEFAULT_EXPIRATION),
        )
    }

    /// Change the cleanup timeout. Zero removes the bound.
    pub fn with_expiration(mut self, timeout: Duration) -> Self {
        self.config.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Append an async cleanup callback.
    pub fn register<F, Fut>(self, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_closable(closable(callback))
    }

    /// Append an already boxed callback.
    pub fn register_closable(mut self, callback: Closable) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Append several callbacks at once.
    pub fn register_all<I>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = Closable>,
    {
        self.callbacks.extend(callbacks);
        self
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Run one shutdown cycle around `workload`.
    ///
    /// Returns as soon as the workload finishes if no termination request
    /// came first. Otherwise runs every cleanup callback and returns when
    /// they are done, or after the watchdog has invoked the terminator.
    /// With `None`, the cycle only waits for a termination request.
    pub async fn run_graceful<F>(&self, workload: Option<F>) -> CycleOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        CycleRuntime::new(&self.config, &self.callbacks)
            .run(workload)
            .await
    }

    /// Shorthand for `run_graceful(Some(workload))`.
    pub async fn process<F>(&self, workload: F) -> CycleOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.run_graceful(Some(workload)).await
    }

    /// Shorthand for `run_graceful(None)`.
    pub async fn wait(&self) -> CycleOutcome {
        self.run_graceful(None::<std::future::Ready<()>>).await
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_appends() {
        let ok = || async { Ok::<(), anyhow::Error>(()) };
        let shutdown = Shutdown::new(ShutdownOptions::new())
            .register(ok)
            .register(ok)
            .register_all(vec![closable(ok)]);
        assert_eq!(shutdown.callback_count(), 3);
    }

    #[test]
    fn signal_variant_uses_default_expiration() {
        let shutdown = Shutdown::with_signals([SignalName::Io]);
        assert_eq!(shutdown.config().timeout(), Some(DEFAULT_EXPIRATION));
        assert_eq!(shutdown.config().signals(), &[SignalName::Io]);

        let unbounded = shutdown.with_expiration(Duration::ZERO);
        assert_eq!(unbounded.config().timeout(), None);
    }
}
