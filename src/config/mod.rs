// src/config/mod.rs

//! Configuration for graceful shutdown.
//!
//! Responsibilities:
//! - Resolve builder options into one immutable [`EffectiveConfig`] (`options.rs`).
//! - Define the TOML-backed file model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert the raw file model (`validate.rs`).
//! - Parse human duration strings such as `"250ms"` (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{RawShutdownFile, RawShutdownSection, ShutdownFile};
pub use options::{EffectiveConfig, ShutdownOptions};
