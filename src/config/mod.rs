// src/config/mod.rs

//! Configuration loading and validation for watchrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated snapshot (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate timing and pattern invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path,
    load_raw_or_default,
};
pub use model::{Configuration, RawConfigFile, RestartTiming};
pub use validate::validate_raw;
