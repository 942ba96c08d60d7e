// src/logging.rs

//! Diagnostics for the supervisor itself, via `tracing`.
//!
//! Diagnostics go to STDERR. STDOUT carries the child's output and the
//! change and failure reports, so the two never interleave in a pipe.
//!
//! Filtering:
//! 1. `--log-level LEVEL` sets the level for watchrun's own targets.
//! 2. Otherwise `WATCHRUN_LOG` is read as an `EnvFilter` directive list,
//!    e.g. `debug` or `watchrun::engine=trace,notify=debug`.
//! 3. Otherwise watchrun logs at `info`.
//!
//! Dependencies stay at `warn` unless a directive names them.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV_VAR: &str = "WATCHRUN_LOG";

const CRATE_TARGET: &str = "watchrun";
const DEPENDENCY_LEVEL: &str = "warn";

/// Install the global subscriber. Call once, before the runtime work starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing the log subscriber")?;

    if let Some(bad) = rejected {
        tracing::warn!(value = %bad, "ignoring invalid {LOG_ENV_VAR}");
    }
    Ok(())
}

/// Directive string for the given inputs.
///
/// The CLI level wins over the environment. A bare level in the environment
/// (`debug`) is scoped to watchrun; anything with a `=` is passed through.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return scoped(level.as_str());
    }

    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) if value.contains('=') => format!("{DEPENDENCY_LEVEL},{value}"),
        Some(value) => scoped(value),
        None => scoped(LogLevel::Info.as_str()),
    }
}

/// Build the filter, falling back to the default when the environment holds
/// something `EnvFilter` rejects. The rejected value is handed back so it
/// can be reported once logging works.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    let directives = filter_directives(cli_level, env);
    match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(_) => {
            let fallback = filter_directives(Some(LogLevel::Info), None);
            (EnvFilter::new(fallback), env.map(str::to_string))
        }
    }
}

fn scoped(level: &str) -> String {
    format!("{DEPENDENCY_LEVEL},{CRATE_TARGET}={}", level.trim().to_lowercase())
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_environment() {
        assert_eq!(
            filter_directives(Some(LogLevel::Debug), Some("trace")),
            "warn,watchrun=debug"
        );
    }

    #[test]
    fn bare_env_level_is_scoped_to_the_crate() {
        assert_eq!(filter_directives(None, Some(" Trace ")), "warn,watchrun=trace");
        assert_eq!(filter_directives(None, Some("")), "warn,watchrun=info");
        assert_eq!(filter_directives(None, None), "warn,watchrun=info");
    }

    #[test]
    fn env_directives_pass_through() {
        assert_eq!(
            filter_directives(None, Some("watchrun::engine=trace,notify=debug")),
            "warn,watchrun::engine=trace,notify=debug"
        );
    }

    #[test]
    fn unparsable_env_falls_back_to_info() {
        let (filter, rejected) = build_filter(None, Some("watchrun=[["));
        assert_eq!(rejected.as_deref(), Some("watchrun=[["));
        assert_eq!(filter.to_string(), EnvFilter::new("warn,watchrun=info").to_string());

        let (_, rejected) = build_filter(None, Some("debug"));
        assert!(rejected.is_none());
    }
}
