// src/exec/backend.rs

//! Pluggable child spawner abstraction.
//!
//! The supervisor talks to a `ChildSpawner` instead of spawning processes
//! itself. This makes it easy to swap in a fake child in tests while keeping
//! the production runner in [`runner`](super::runner).
//!
//! - `RealSpawner` is the default implementation used by `watchrun`. Every
//!   spawn runs [`run_child`] in its own Tokio task.
//! - Tests can provide their own `ChildSpawner` that, for example, records
//!   spawns and emits `ChildOutput` / `ChildExited` events on demand.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::{RunId, RuntimeEvent};
use crate::exec::runner::run_child;
use crate::exec::{ChildCommand, ChildHandle};

/// Trait abstracting how the supervised child is started.
///
/// Spawning never fails from the caller's point of view: a child that cannot
/// be started reports its failure through the usual exit event.
pub trait ChildSpawner: Send {
    fn spawn(&mut self, run_id: RunId, events: mpsc::Sender<RuntimeEvent>) -> ChildHandle;
}

/// Real spawner used in production.
#[derive(Debug, Clone)]
pub struct RealSpawner {
    command: ChildCommand,
}

impl RealSpawner {
    pub fn new(command: ChildCommand) -> Self {
        Self { command }
    }
}

impl ChildSpawner for RealSpawner {
    fn spawn(&mut self, run_id: RunId, events: mpsc::Sender<RuntimeEvent>) -> ChildHandle {
        let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let cmd = self.command.clone();

        tokio::spawn(async move {
            run_child(run_id, cmd, events, input_rx, kill_rx).await;
            debug!(run_id, "child runner future finished");
        });

        ChildHandle::new(run_id, input_tx, kill_tx)
    }
}
