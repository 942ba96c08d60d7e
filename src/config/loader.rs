// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::{Configuration, RawConfigFile};
use crate::errors::Result;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Watchrun.toml";

/// Load a configuration file from a given path and return the raw model.
///
/// This only performs TOML deserialization; semantic validation happens when
/// converting into a [`Configuration`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Configuration> {
    let raw = load_from_path(path)?;
    Configuration::try_from(raw)
}

/// Load the raw config, tolerating a missing file when `required` is false.
///
/// The CLI passes `required = false` for the default location so a project
/// without a `Watchrun.toml` runs on built-in defaults. An explicitly named
/// file must exist.
pub fn load_raw_or_default(path: impl AsRef<Path>, required: bool) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !required && !path.exists() {
        debug!(?path, "no config file found; using built-in defaults");
        return Ok(RawConfigFile::default());
    }
    load_from_path(path)
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
