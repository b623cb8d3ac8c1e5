// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawShutdownFile, ShutdownFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawShutdownFile`.
///
/// This only performs TOML deserialization; duration strings are not
/// parsed yet. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawShutdownFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawShutdownFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML (unknown keys and signal names are rejected here).
/// - Parses the `timeout` duration string.
/// - Rejects an explicitly empty `signals` list.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ShutdownFile> {
    let raw = load_from_path(&path)?;
    ShutdownFile::try_from(raw)
}
