// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Everything before an optional `--` belongs to the supervisor; everything
//! after it is forwarded verbatim to the supervised child.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Run a development process, restarting or live-reloading it on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Entry point file handed to the child command.
    ///
    /// If omitted, `entry` from the config file is used, then the `main`
    /// field of `package.json` in the working directory.
    #[arg(value_name = "ENTRY")]
    pub entry: Option<PathBuf>,

    /// Arguments forwarded to the child, given after `--`.
    #[arg(last = true, value_name = "ARGS")]
    pub child_args: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// A missing file at the default location is not an error; built-in
    /// defaults are used instead.
    #[arg(long, value_name = "PATH", default_value = "Watchrun.toml")]
    pub config: String,

    /// Directory to watch (repeatable). Replaces `watch_dirs` from the config.
    #[arg(long = "watch", value_name = "DIR")]
    pub watch: Vec<PathBuf>,

    /// Extra ignore pattern (repeatable). Appended to `ignore`.
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Extra live-reload pattern (repeatable). Appended to `live`.
    #[arg(long = "live", value_name = "PATTERN")]
    pub live: Vec<String>,

    /// Always use the polling watch backend.
    #[arg(long)]
    pub poll: bool,

    /// Never colour change lines or the repeat marker.
    ///
    /// Colour is otherwise used when stdout is a terminal and `NO_COLOR`
    /// is unset.
    #[arg(long)]
    pub no_color: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and entry point, print them, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_after_separator_go_to_the_child() {
        let args = CliArgs::parse_from([
            "watchrun",
            "--watch",
            "src",
            "server.js",
            "--",
            "--port",
            "3000",
        ]);
        assert_eq!(args.entry, Some(PathBuf::from("server.js")));
        assert_eq!(args.watch, vec![PathBuf::from("src")]);
        assert_eq!(args.child_args, vec!["--port".to_string(), "3000".to_string()]);
    }

    #[test]
    fn entry_is_optional() {
        let args = CliArgs::parse_from(["watchrun", "--", "-v"]);
        assert!(args.entry.is_none());
        assert_eq!(args.child_args, vec!["-v".to_string()]);
        assert_eq!(args.config, "Watchrun.toml");
        assert!(!args.no_color);
    }

    #[test]
    fn no_color_flag_is_parsed() {
        let args = CliArgs::parse_from(["watchrun", "--no-color", "app.js"]);
        assert!(args.no_color);
        assert_eq!(args.entry, Some(PathBuf::from("app.js")));
    }
}
