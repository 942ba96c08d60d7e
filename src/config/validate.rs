// src/config/validate.rs

use crate::config::model::RawConfigFile;
use crate::errors::{Result, WatchrunError};
use crate::watch::patterns::PatternMatcher;

/// Run semantic validation against a deserialized configuration.
///
/// This checks:
/// - `min_restart_delay` is non-zero and `<= max_restart_delay`
/// - `restart_delay_backoff` is finite and `> 1`
/// - `clean_time` and `poll_interval` are non-zero
/// - at least one watch directory is configured
/// - `ignore` / `live` patterns compile
///
/// It does **not** check that watch directories exist; a missing directory is
/// reported by the watcher at startup.
pub fn validate_raw(cfg: &RawConfigFile) -> Result<()> {
    validate_timing(cfg)?;
    validate_watch(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn validate_timing(cfg: &RawConfigFile) -> Result<()> {
    // A zero floor would keep every escalated delay at zero.
    if cfg.min_restart_delay == 0 {
        return Err(WatchrunError::ConfigError(
            "min_restart_delay must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.min_restart_delay > cfg.max_restart_delay {
        return Err(WatchrunError::ConfigError(format!(
            "min_restart_delay ({}) must not exceed max_restart_delay ({})",
            cfg.min_restart_delay, cfg.max_restart_delay
        )));
    }

    if !cfg.restart_delay_backoff.is_finite() || cfg.restart_delay_backoff <= 1.0 {
        return Err(WatchrunError::ConfigError(format!(
            "restart_delay_backoff must be greater than 1 (got {})",
            cfg.restart_delay_backoff
        )));
    }

    if cfg.clean_time == 0 {
        return Err(WatchrunError::ConfigError(
            "clean_time must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch_dirs.is_empty() {
        return Err(WatchrunError::ConfigError(
            "watch_dirs must contain at least one directory".to_string(),
        ));
    }

    if cfg.poll_interval == 0 {
        return Err(WatchrunError::ConfigError(
            "poll_interval must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (name, patterns) in [("ignore", &cfg.ignore), ("live", &cfg.live)] {
        if let Some(empty) = patterns.iter().position(|p| p.trim().is_empty()) {
            return Err(WatchrunError::ConfigError(format!(
                "{name} pattern #{empty} is empty"
            )));
        }
        PatternMatcher::compile(patterns)?;
    }
    Ok(())
}
