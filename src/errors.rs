// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Nothing in a shutdown cycle itself returns these: cycle failures are
//! reported through the log sink or the terminator. They surface only
//! from configuration loading, CLI wiring and command spawning.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GracefulError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GracefulError>;
