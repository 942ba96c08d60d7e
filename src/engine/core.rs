// src/engine/core.rs

//! Pure supervisor state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`RuntimeEvent`]s (plus the current time) and produces:
//! - an updated core state
//! - output written to the active sink
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Supervisor`) owns the child process,
//! the timers and the event channel. The core never touches any of those,
//! so it can be driven step by step in tests with synthetic timestamps.
//!
//! Per run, the states are:
//!
//! ```text
//! Starting -> Running -> { Buffering | CleanRunning } -> Closed -> (restart timer) -> Starting
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::engine::router::{ChangeRouter, Route};
use crate::engine::state::RestartState;
use crate::engine::{ChildExit, RunId, RuntimeEvent};
use crate::output::dedupe::canonicalize;
use crate::output::sink::{OutputSink, SinkSwitch};
use crate::output::style::{ReportStyle, Tone};

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a new child process for this run.
    Spawn { run_id: RunId },
    /// Terminate the child of this run.
    Kill { run_id: RunId },
    /// Write one wire-format line to the child's stdin.
    SendInput { run_id: RunId, line: String },
    /// (Re)arm the clean timer; replaces any pending one.
    ArmCleanTimer { run_id: RunId, after: Duration },
    CancelCleanTimer,
    /// (Re)arm the restart timer; replaces any pending one.
    ArmRestartTimer { after: Duration },
    CancelRestartTimer,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn keep(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Core-side view of the running child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRun {
    run_id: RunId,
    killed_by_us: bool,
}

impl ActiveRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// True once the supervisor has asked this run to terminate.
    pub fn killed_by_us(&self) -> bool {
        self.killed_by_us
    }
}

/// The supervisor state machine.
///
/// Owns the restart bookkeeping, the change router and the output sinks.
/// At most one run is active; at most one restart is pending.
pub struct SupervisorCore {
    restart: RestartState,
    router: ChangeRouter,
    sinks: SinkSwitch,
    style: ReportStyle,
    run: Option<ActiveRun>,
    next_run_id: RunId,
    restart_pending: bool,
    shutting_down: bool,
}

impl std::fmt::Debug for SupervisorCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorCore")
            .field("restart", &self.restart)
            .field("run", &self.run)
            .field("restart_pending", &self.restart_pending)
            .field("shutting_down", &self.shutting_down)
            .finish_non_exhaustive()
    }
}

impl SupervisorCore {
    pub fn new(
        cfg: &Configuration,
        router: ChangeRouter,
        direct: impl OutputSink + 'static,
    ) -> Self {
        Self {
            restart: RestartState::new(cfg.timing()),
            router,
            sinks: SinkSwitch::new(direct),
            style: ReportStyle::PLAIN,
            run: None,
            next_run_id: 1,
            restart_pending: false,
            shutting_down: false,
        }
    }

    /// Colour change lines and the repeat marker.
    pub fn with_style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    pub fn active_run(&self) -> Option<ActiveRun> {
        self.run
    }

    pub fn restart_state(&self) -> &RestartState {
        &self.restart
    }

    pub fn current_delay(&self) -> Duration {
        self.restart.current_delay()
    }

    pub fn is_buffering(&self) -> bool {
        self.sinks.is_buffering()
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    /// Handle a single event at time `now`.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        match event {
            RuntimeEvent::StartRequested => self.handle_start_request(now),
            RuntimeEvent::ChildOutput { run_id, bytes } => {
                self.handle_output(run_id, &bytes);
                CoreStep::keep(Vec::new())
            }
            RuntimeEvent::ChildExited { run_id, exit } => self.handle_exit(run_id, exit),
            RuntimeEvent::CleanTimerElapsed { run_id } => {
                self.handle_clean_timer(run_id);
                CoreStep::keep(Vec::new())
            }
            RuntimeEvent::RestartTimerElapsed => self.handle_restart_timer(now),
            RuntimeEvent::FileChanged(change) => {
                let route = self.router.route(&change);
                CoreStep::keep(self.handle_route(route))
            }
            RuntimeEvent::ShutdownRequested => self.handle_shutdown(),
        }
    }

    fn handle_start_request(&mut self, now: Instant) -> CoreStep {
        if self.run.is_some() || self.restart_pending || self.shutting_down {
            debug!("start requested while a run is active or scheduled; ignoring");
            return CoreStep::keep(Vec::new());
        }
        CoreStep::keep(self.start(now))
    }

    fn handle_restart_timer(&mut self, now: Instant) -> CoreStep {
        if !self.restart_pending {
            debug!("stale restart timer; ignoring");
            return CoreStep::keep(Vec::new());
        }
        self.restart_pending = false;
        if self.shutting_down {
            return CoreStep::keep(Vec::new());
        }

        let delay = self.restart.escalate();
        debug!(next_delay_ms = delay.as_millis() as u64, "restart delay escalated");
        CoreStep::keep(self.start(now))
    }

    fn start(&mut self, now: Instant) -> Vec<CoreCommand> {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.run = Some(ActiveRun {
            run_id,
            killed_by_us: false,
        });

        let mut commands = vec![CoreCommand::Spawn { run_id }];

        if self.restart.record_start(now) {
            info!(run_id, "starting child");
        } else {
            let clean_time = self.restart.timing().clean_time;
            info!(
                run_id,
                clean_time_ms = clean_time.as_millis() as u64,
                "restarting child; buffering output until it proves stable"
            );
            self.sinks.start_buffering();
            commands.push(CoreCommand::ArmCleanTimer {
                run_id,
                after: clean_time,
            });
        }

        commands
    }

    fn handle_output(&mut self, run_id: RunId, bytes: &[u8]) {
        if self.run.map(|r| r.run_id) != Some(run_id) {
            debug!(run_id, "output from a finished run");
        }
        if let Err(e) = self.sinks.active().write_bytes(bytes) {
            warn!(run_id, error = %e, "failed to write child output");
        }
    }

    fn handle_clean_timer(&mut self, run_id: RunId) {
        if self.run.map(|r| r.run_id) != Some(run_id) || !self.sinks.is_buffering() {
            debug!(run_id, "stale clean timer; ignoring");
            return;
        }

        info!(run_id, "child is stable; backoff reset");
        let buffered = self.sinks.restore_direct();
        self.write_direct(&buffered.into_bytes());
        self.restart.mark_stable();
    }

    fn handle_exit(&mut self, run_id: RunId, exit: ChildExit) -> CoreStep {
        let run = match self.run {
            Some(run) if run.run_id == run_id => run,
            _ => {
                debug!(run_id, "exit from an unknown run; ignoring");
                return CoreStep::keep(Vec::new());
            }
        };
        self.run = None;

        match exit {
            ChildExit::Exited { code, success } if success || run.killed_by_us => {
                info!(run_id, ?code, killed_by_us = run.killed_by_us, "child exited");
            }
            ChildExit::Exited { code, .. } => warn!(run_id, ?code, "child exited with failure"),
            ChildExit::Failed => warn!(run_id, "child could not be run"),
        }

        let buffered = self.sinks.restore_direct();
        let signature = canonicalize(&buffered.text());
        let had_output = !buffered.is_empty();
        let same = self.restart.remember_signature(signature);

        if !same && had_output {
            // Start a new failure on its own line, clear of any markers.
            let mut dump = b"\n".to_vec();
            dump.extend_from_slice(&buffered.into_bytes());
            self.write_direct(&dump);
        } else if same && !run.killed_by_us {
            let marker = self.style.repeat_marker();
            self.write_direct(marker.as_bytes());
        }

        let mut commands = vec![CoreCommand::CancelCleanTimer];

        if self.shutting_down {
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        let after = self.restart.current_delay();
        debug!(run_id, delay_ms = after.as_millis() as u64, "scheduling restart");
        self.restart_pending = true;
        commands.push(CoreCommand::ArmRestartTimer { after });

        CoreStep::keep(commands)
    }

    fn handle_route(&mut self, route: Route) -> Vec<CoreCommand> {
        match route {
            Route::Ignored => Vec::new(),
            Route::Live {
                description,
                change,
            } => {
                self.announce(Tone::Live, &description);
                let Some(run) = self.run.filter(|r| !r.killed_by_us) else {
                    debug!(path = %change.path, "no running child; dropping live change");
                    return Vec::new();
                };
                match change.to_line() {
                    Ok(line) => vec![CoreCommand::SendInput {
                        run_id: run.run_id,
                        line,
                    }],
                    Err(e) => {
                        warn!(error = %e, "failed to encode live change");
                        Vec::new()
                    }
                }
            }
            Route::Restart { description } => {
                self.announce(Tone::Restart, &description);
                match self.run.as_mut() {
                    Some(run) if !run.killed_by_us => {
                        run.killed_by_us = true;
                        vec![CoreCommand::Kill { run_id: run.run_id }]
                    }
                    _ => {
                        debug!("child already stopping or not running; nothing to kill");
                        Vec::new()
                    }
                }
            }
        }
    }

    fn handle_shutdown(&mut self) -> CoreStep {
        info!("shutdown requested");
        self.shutting_down = true;

        let mut commands = vec![CoreCommand::CancelCleanTimer, CoreCommand::CancelRestartTimer];
        self.restart_pending = false;

        match self.run.as_mut() {
            Some(run) => {
                if !run.killed_by_us {
                    run.killed_by_us = true;
                    commands.push(CoreCommand::Kill { run_id: run.run_id });
                }
                // Keep running until the child's exit arrives.
                CoreStep::keep(commands)
            }
            None => CoreStep {
                commands,
                keep_running: false,
            },
        }
    }

    /// Change lines bypass the failure buffer so they never end up in a
    /// failure signature.
    fn announce(&mut self, tone: Tone, description: &str) {
        let line = self.style.change_line(tone, description);
        self.write_direct(line.as_bytes());
    }

    fn write_direct(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.sinks.direct().write_bytes(bytes) {
            warn!(error = %e, "failed to write to output");
        }
    }
}
