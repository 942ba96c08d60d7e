// src/engine/mod.rs

//! Supervision engine for watchrun.
//!
//! This module ties together:
//! - the restart/backoff bookkeeping ([`state`])
//! - change routing (ignore / live-reload / restart, [`router`])
//! - the pure supervisor state machine ([`core`])
//! - the async IO shell that owns the child, the timers and the event
//!   channel ([`runtime`])

use crate::types::ChangeEvent;

/// Identifies one start of the supervised child.
pub type RunId = u64;

/// How a child run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// The process ran and exited (`code` is `None` when killed by a signal).
    Exited { code: Option<i32>, success: bool },
    /// The process could not be spawned or waited on.
    Failed,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        matches!(self, ChildExit::Exited { success: true, .. })
    }
}

/// Events flowing into the runtime from the watcher, the child and timers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Start the child if nothing is running or scheduled.
    StartRequested,
    /// Raw bytes the child wrote to stdout or stderr.
    ChildOutput { run_id: RunId, bytes: Vec<u8> },
    /// The child exited (or never started). All of its output has already
    /// been delivered.
    ChildExited { run_id: RunId, exit: ChildExit },
    /// The stability window of a buffered run elapsed.
    CleanTimerElapsed { run_id: RunId },
    /// The restart delay elapsed.
    RestartTimerElapsed,
    /// A filesystem change inside a watched directory.
    FileChanged(ChangeEvent),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod router;
pub mod runtime;
pub mod state;

pub use core::{ActiveRun, CoreCommand, CoreStep, SupervisorCore};
pub use crate::output::style::FAILURE_REPEAT_MARKER;
pub use router::{ChangeRouter, Route, WireChange};
pub use runtime::Supervisor;
pub use state::RestartState;
