// src/exec/handle.rs

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::RunId;

/// The supervisor's reference to one running child.
///
/// - `input` feeds lines to the child's stdin.
/// - `kill` requests termination; the exit is still reported through the
///   normal `ChildExited` event.
#[derive(Debug)]
pub struct ChildHandle {
    run_id: RunId,
    input: mpsc::UnboundedSender<String>,
    kill: Option<oneshot::Sender<()>>,
}

impl ChildHandle {
    pub fn new(
        run_id: RunId,
        input: mpsc::UnboundedSender<String>,
        kill: oneshot::Sender<()>,
    ) -> Self {
        Self {
            run_id,
            input,
            kill: Some(kill),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Queue a line for the child's stdin. Returns false if the child is
    /// no longer accepting input.
    pub fn send_input(&self, line: String) -> bool {
        self.input.send(line).is_ok()
    }

    /// Request termination. Returns false if a kill was already requested
    /// or the child has already gone away.
    pub fn kill(&mut self) -> bool {
        match self.kill.take() {
            Some(tx) => {
                if tx.send(()).is_err() {
                    debug!(run_id = self.run_id, "child already finished while killing");
                    return false;
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_kill_is_a_no_op() {
        let (input_tx, _input_rx) = mpsc::unbounded_channel();
        let (kill_tx, mut kill_rx) = oneshot::channel();
        let mut handle = ChildHandle::new(7, input_tx, kill_tx);

        assert!(handle.kill());
        assert!(!handle.kill());
        assert!(kill_rx.try_recv().is_ok());
    }

    #[test]
    fn input_fails_once_receiver_is_gone() {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (kill_tx, _kill_rx) = oneshot::channel();
        let handle = ChildHandle::new(1, input_tx, kill_tx);

        assert!(handle.send_input("a\n".to_string()));
        drop(input_rx);
        assert!(!handle.send_input("b\n".to_string()));
    }
}
