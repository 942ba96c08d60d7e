// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::validate::validate_raw;
use crate::errors::WatchrunError;

/// Configuration as read from a TOML file.
///
/// Every key is optional:
///
/// ```toml
/// min_restart_delay = 500       # ms
/// max_restart_delay = 5000      # ms
/// restart_delay_backoff = 2.0
/// clean_time = 2000             # ms
/// watch_dirs = ["src", "public"]
/// ignore = ["*.log", "node_modules"]
/// live = ["public", "views"]
/// command = ["node", "--enable-source-maps"]
/// entry = "server.js"
/// poll = false
/// poll_interval = 1000          # ms
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Lower bound of the restart backoff, in milliseconds.
    #[serde(default = "default_min_restart_delay")]
    pub min_restart_delay: u64,

    /// Upper bound of the restart backoff, in milliseconds.
    #[serde(default = "default_max_restart_delay")]
    pub max_restart_delay: u64,

    /// Multiplier applied to the delay after each unclean restart.
    #[serde(default = "default_restart_delay_backoff")]
    pub restart_delay_backoff: f64,

    /// How long (ms) a run must stay up to count as stable.
    #[serde(default = "default_clean_time")]
    pub clean_time: u64,

    /// Directories to watch recursively.
    #[serde(default = "default_watch_dirs")]
    pub watch_dirs: Vec<PathBuf>,

    /// Patterns whose changes are ignored entirely.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Patterns whose changes are forwarded to the child instead of
    /// restarting it.
    #[serde(default = "default_live")]
    pub live: Vec<String>,

    /// Program (plus leading arguments) used to run the entry point.
    ///
    /// Defaults to `node`. An explicit empty list means the entry point is
    /// executed directly.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Entry point used when none is given on the command line.
    #[serde(default)]
    pub entry: Option<PathBuf>,

    /// Skip the native backend and always poll.
    #[serde(default)]
    pub poll: bool,

    /// Poll interval in milliseconds (polling backend only).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_min_restart_delay() -> u64 {
    500
}

fn default_max_restart_delay() -> u64 {
    5_000
}

fn default_restart_delay_backoff() -> f64 {
    2.0
}

fn default_clean_time() -> u64 {
    2_000
}

fn default_watch_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

const DEFAULT_IGNORE: &[&str] = &[
    ".DS_Store",
    ".cache",
    ".git",
    ".idea",
    ".project",
    "coverage",
    "data",
    "log",
    "node_modules",
];

const DEFAULT_LIVE: &[&str] = &["public", "scripts", "styles", "views"];

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect()
}

fn default_live() -> Vec<String> {
    DEFAULT_LIVE.iter().map(|p| p.to_string()).collect()
}

fn default_command() -> Vec<String> {
    vec!["node".to_string()]
}

fn default_poll_interval() -> u64 {
    1_000
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            min_restart_delay: default_min_restart_delay(),
            max_restart_delay: default_max_restart_delay(),
            restart_delay_backoff: default_restart_delay_backoff(),
            clean_time: default_clean_time(),
            watch_dirs: default_watch_dirs(),
            ignore: default_ignore(),
            live: default_live(),
            command: default_command(),
            entry: None,
            poll: false,
            poll_interval: default_poll_interval(),
        }
    }
}

/// Backoff and stability timing, split out so the state machine does not
/// depend on the rest of the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestartTiming {
    pub min_restart_delay: Duration,
    pub max_restart_delay: Duration,
    pub restart_delay_backoff: f64,
    pub clean_time: Duration,
}

/// Validated, immutable configuration snapshot.
///
/// Built once at startup and passed by reference to the components that need
/// it. Only constructible through `TryFrom<RawConfigFile>`, so holding one
/// means the invariants (`min <= max`, `backoff > 1`, ...) hold.
#[derive(Debug, Clone)]
pub struct Configuration {
    timing: RestartTiming,
    watch_dirs: Vec<PathBuf>,
    ignore: Vec<String>,
    live: Vec<String>,
    command: Vec<String>,
    entry: Option<PathBuf>,
    poll: bool,
    poll_interval: Duration,
}

impl Configuration {
    pub fn timing(&self) -> RestartTiming {
        self.timing
    }

    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore
    }

    pub fn live_patterns(&self) -> &[String] {
        &self.live
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn entry(&self) -> Option<&PathBuf> {
        self.entry.as_ref()
    }

    pub fn force_poll(&self) -> bool {
        self.poll
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Configuration {
    /// Build without validation; callers must have run `validate_raw`.
    fn from_validated(raw: RawConfigFile) -> Self {
        Self {
            timing: RestartTiming {
                min_restart_delay: Duration::from_millis(raw.min_restart_delay),
                max_restart_delay: Duration::from_millis(raw.max_restart_delay),
                restart_delay_backoff: raw.restart_delay_backoff,
                clean_time: Duration::from_millis(raw.clean_time),
            },
            watch_dirs: raw.watch_dirs,
            ignore: raw.ignore,
            live: raw.live,
            command: raw.command,
            entry: raw.entry,
            poll: raw.poll,
            poll_interval: Duration::from_millis(raw.poll_interval),
        }
    }
}

impl TryFrom<RawConfigFile> for Configuration {
    type Error = WatchrunError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        validate_raw(&raw)?;
        Ok(Self::from_validated(raw))
    }
}

impl Default for Configuration {
    // The built-in defaults satisfy every check in `validate_raw`.
    fn default() -> Self {
        Self::from_validated(RawConfigFile::default())
    }
}
