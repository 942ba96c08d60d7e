// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod entry;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod types;
pub mod watch;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_raw_or_default, Configuration, RawConfigFile};
use crate::engine::{ChangeRouter, RuntimeEvent, Supervisor, SupervisorCore};
use crate::entry::resolve_entry;
use crate::exec::{ChildCommand, RealSpawner};
use crate::output::{DirectSink, ReportStyle};
use crate::watch::{spawn_watcher, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - entry-point resolution
/// - the file watcher
/// - the supervisor core, its IO shell and the real child spawner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;

    let project_dir = std::env::current_dir().context("reading the current directory")?;
    let entry = resolve_entry(args.entry.as_deref(), &cfg, &project_dir)?;
    let command = ChildCommand::new(cfg.command(), &entry, &args.child_args, &project_dir);

    if args.dry_run {
        print_dry_run(&cfg, &command);
        return Ok(());
    }

    let root = project_dir
        .canonicalize()
        .unwrap_or_else(|_| project_dir.clone());

    // Supervisor event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(256);

    let _watcher_handle = spawn_watcher(WatchOptions::from_config(&cfg), rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(cmd = %command, root = %root.display(), "supervising");

    let router = ChangeRouter::from_config(&cfg, root)?;
    let style = report_style(&args, std::io::stdout().is_terminal());
    let core = SupervisorCore::new(&cfg, router, DirectSink::stdout()).with_style(style);
    let supervisor = Supervisor::new(core, rt_tx, rt_rx, RealSpawner::new(command));

    supervisor.run().await?;
    Ok(())
}

/// Load the config file (a missing file at the default location is fine),
/// apply command-line overrides and validate the result.
pub fn load_config(args: &CliArgs) -> Result<Configuration> {
    let config_path = PathBuf::from(&args.config);
    let required = config_path != default_config_path();

    let mut raw = load_raw_or_default(&config_path, required)?;
    apply_cli_overrides(&mut raw, args);

    let cfg = Configuration::try_from(raw)
        .with_context(|| format!("invalid configuration ({})", config_path.display()))?;
    Ok(cfg)
}

/// `--watch` replaces the configured directories; `--ignore` and `--live`
/// extend the configured patterns; `--poll` can only switch polling on.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if !args.watch.is_empty() {
        raw.watch_dirs = args.watch.clone();
    }
    raw.ignore.extend(args.ignore.iter().cloned());
    raw.live.extend(args.live.iter().cloned());
    raw.poll |= args.poll;
}

/// Colour only for a terminal, and never with `--no-color` or `NO_COLOR`.
pub fn report_style(args: &CliArgs, stdout_is_terminal: bool) -> ReportStyle {
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    ReportStyle::new(stdout_is_terminal && !args.no_color && !no_color_env)
}

/// Simple dry-run output: print the resolved command and settings.
fn print_dry_run(cfg: &Configuration, command: &ChildCommand) {
    let timing = cfg.timing();

    println!("watchrun dry-run");
    println!("  command: {command}");
    println!("  cwd: {}", command.cwd.display());
    println!();

    println!("restart:");
    println!("  min_restart_delay: {:?}", timing.min_restart_delay);
    println!("  max_restart_delay: {:?}", timing.max_restart_delay);
    println!("  restart_delay_backoff: {}", timing.restart_delay_backoff);
    println!("  clean_time: {:?}", timing.clean_time);
    println!();

    println!("watch ({}):", if cfg.force_poll() { "poll" } else { "native, poll fallback" });
    for dir in cfg.watch_dirs() {
        println!("  - {}", dir.display());
    }
    if !cfg.ignore_patterns().is_empty() {
        println!("  ignore: {:?}", cfg.ignore_patterns());
    }
    if !cfg.live_patterns().is_empty() {
        println!("  live: {:?}", cfg.live_patterns());
    }

    debug!("dry-run complete (no execution)");
}
