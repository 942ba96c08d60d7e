// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{ChildHandle, ChildSpawner};

use super::core::SupervisorCore;
use super::{CoreCommand, RunId, RuntimeEvent};

/// Drives the supervisor state machine in response to `RuntimeEvent`s and
/// delegates process handling to a `ChildSpawner`.
///
/// This is a pure IO shell around `SupervisorCore`, which contains all the
/// restart and reporting semantics. This struct handles async IO: reading
/// events from the channel, owning the child handle and the two timers.
pub struct Supervisor<S: ChildSpawner> {
    core: SupervisorCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    /// Handed to children and timers so they can report back.
    event_tx: mpsc::Sender<RuntimeEvent>,
    spawner: S,
    child: Option<ChildHandle>,
    clean_timer: Option<JoinHandle<()>>,
    restart_timer: Option<JoinHandle<()>>,
}

impl<S: ChildSpawner> fmt::Debug for Supervisor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}

impl<S: ChildSpawner> Supervisor<S> {
    pub fn new(
        core: SupervisorCore,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        spawner: S,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            spawner,
            child: None,
            clean_timer: None,
            restart_timer: None,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the child immediately.
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core and executes the commands it returns
    ///   (spawn, kill, stdin writes, timers).
    pub async fn run(mut self) -> Result<()> {
        info!("watchrun supervisor started");

        let mut keep_running = self.dispatch(RuntimeEvent::StartRequested);

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("supervisor event channel closed; exiting");
                    break;
                }
            };

            keep_running = self.dispatch(event);
        }

        self.cancel_clean_timer();
        self.cancel_restart_timer();
        if let Some(mut child) = self.child.take() {
            child.kill();
        }

        info!("supervisor exiting");
        Ok(())
    }

    /// Feed one event into the core and execute the resulting commands.
    fn dispatch(&mut self, event: RuntimeEvent) -> bool {
        match &event {
            RuntimeEvent::ChildOutput { run_id, bytes } => {
                debug!(run_id, len = bytes.len(), "child output")
            }
            other => debug!(event = ?other, "supervisor received event"),
        }

        let step = self.core.step(event, Instant::now());
        for command in step.commands {
            self.execute_command(command);
        }

        if !step.keep_running {
            info!("core requested exit; stopping supervisor");
        }
        step.keep_running
    }

    /// Execute a single command from the core.
    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::Spawn { run_id } => {
                let handle = self.spawner.spawn(run_id, self.event_tx.clone());
                if let Some(previous) = self.child.replace(handle) {
                    debug!(previous = previous.run_id(), run_id, "replacing finished child handle");
                }
            }
            CoreCommand::Kill { run_id } => match self.child_for(run_id) {
                Some(child) => {
                    if !child.kill() {
                        debug!(run_id, "kill request was redundant");
                    }
                }
                None => debug!(run_id, "kill for a child that is gone; ignoring"),
            },
            CoreCommand::SendInput { run_id, line } => match self.child_for(run_id) {
                Some(child) => {
                    if !child.send_input(line) {
                        warn!(run_id, "child no longer accepts input; change dropped");
                    }
                }
                None => debug!(run_id, "input for a child that is gone; dropping"),
            },
            CoreCommand::ArmCleanTimer { run_id, after } => {
                self.cancel_clean_timer();
                self.clean_timer = Some(self.arm(after, RuntimeEvent::CleanTimerElapsed { run_id }));
            }
            CoreCommand::CancelCleanTimer => self.cancel_clean_timer(),
            CoreCommand::ArmRestartTimer { after } => {
                self.cancel_restart_timer();
                self.restart_timer = Some(self.arm(after, RuntimeEvent::RestartTimerElapsed));
            }
            CoreCommand::CancelRestartTimer => self.cancel_restart_timer(),
        }
    }

    fn child_for(&mut self, run_id: RunId) -> Option<&mut ChildHandle> {
        self.child.as_mut().filter(|c| c.run_id() == run_id)
    }

    fn arm(&self, after: Duration, event: RuntimeEvent) -> JoinHandle<()> {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            if !after.is_zero() {
                tokio::time::sleep(after).await;
            }
            let _ = tx.send(event).await;
        })
    }

    fn cancel_clean_timer(&mut self) {
        if let Some(timer) = self.clean_timer.take() {
            timer.abort();
        }
    }

    fn cancel_restart_timer(&mut self) {
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
    }
}
