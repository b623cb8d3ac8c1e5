// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{RawShutdownFile, ShutdownFile};
use crate::errors::{GracefulError, Result};

impl TryFrom<RawShutdownFile> for ShutdownFile {
    type Error = GracefulError;

    fn try_from(raw: RawShutdownFile) -> std::result::Result<Self, Self::Error> {
        let section = raw.shutdown;

        let timeout = section.timeout.as_deref().map(parse_duration).transpose()?;

        if let Some(ref signals) = section.signals {
            ensure_signals_not_empty(signals)?;
        }

        Ok(ShutdownFile {
            timeout,
            signals: section.signals,
            on_callback_failure: section.on_callback_failure,
        })
    }
}

fn ensure_signals_not_empty<T>(signals: &[T]) -> Result<()> {
    if signals.is_empty() {
        return Err(GracefulError::ConfigError(
            "[shutdown].signals must list at least one signal (omit the key for the default set)"
                .to_string(),
        ));
    }
    Ok(())
}
