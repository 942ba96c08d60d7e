#![allow(dead_code)]

use std::path::PathBuf;

use watchrun::config::{Configuration, RawConfigFile};

/// Builder for `Configuration` to simplify test setup.
///
/// Starts from the built-in defaults.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Set min/max restart delay in milliseconds.
    pub fn delays(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.config.min_restart_delay = min_ms;
        self.config.max_restart_delay = max_ms;
        self
    }

    pub fn backoff(mut self, factor: f64) -> Self {
        self.config.restart_delay_backoff = factor;
        self
    }

    pub fn clean_time(mut self, ms: u64) -> Self {
        self.config.clean_time = ms;
        self
    }

    pub fn watch(mut self, dir: &str) -> Self {
        self.config.watch_dirs.push(PathBuf::from(dir));
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.ignore.push(pattern.to_string());
        self
    }

    /// Drop the default ignore list.
    pub fn no_default_ignores(mut self) -> Self {
        self.config.ignore.clear();
        self
    }

    pub fn live(mut self, pattern: &str) -> Self {
        self.config.live.push(pattern.to_string());
        self
    }

    /// Drop the default live-reload list.
    pub fn no_default_live(mut self) -> Self {
        self.config.live.clear();
        self
    }

    pub fn command(mut self, argv: &[&str]) -> Self {
        self.config.command = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> Configuration {
        Configuration::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
