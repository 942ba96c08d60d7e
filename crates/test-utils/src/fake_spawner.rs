use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use watchrun::engine::{ChildExit, RunId, RuntimeEvent};
use watchrun::exec::{ChildHandle, ChildSpawner};

/// Everything the fake children have seen so far.
#[derive(Debug, Default)]
struct FakeState {
    spawned: Vec<RunId>,
    killed: Vec<RunId>,
    inputs: Vec<(RunId, String)>,
    events: Option<mpsc::Sender<RuntimeEvent>>,
}

/// A fake spawner that:
/// - records which runs were started
/// - records stdin lines per run
/// - answers a kill request with an immediate `ChildExited` (signal exit)
///
/// Output and voluntary exits are scripted from the test with [`emit`] and
/// [`exit`]. Clone it: one copy goes into the `Supervisor`, the test keeps
/// the other.
///
/// [`emit`]: FakeSpawner::emit
/// [`exit`]: FakeSpawner::exit
#[derive(Debug, Clone, Default)]
pub struct FakeSpawner {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> Vec<RunId> {
        self.state.lock().unwrap().spawned.clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.state.lock().unwrap().spawned.len()
    }

    /// The most recently started run.
    pub fn last_run(&self) -> Option<RunId> {
        self.state.lock().unwrap().spawned.last().copied()
    }

    pub fn killed(&self) -> Vec<RunId> {
        self.state.lock().unwrap().killed.clone()
    }

    pub fn inputs(&self, run_id: RunId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .inputs
            .iter()
            .filter(|(id, _)| *id == run_id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn events(&self) -> mpsc::Sender<RuntimeEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("nothing spawned yet")
    }

    /// Make `run_id` write `text` to its output.
    pub async fn emit(&self, run_id: RunId, text: &str) {
        self.events()
            .send(RuntimeEvent::ChildOutput {
                run_id,
                bytes: text.as_bytes().to_vec(),
            })
            .await
            .expect("supervisor channel closed");
    }

    /// Make `run_id` exit on its own with `code`.
    pub async fn exit(&self, run_id: RunId, code: i32) {
        self.events()
            .send(RuntimeEvent::ChildExited {
                run_id,
                exit: ChildExit::Exited {
                    code: Some(code),
                    success: code == 0,
                },
            })
            .await
            .expect("supervisor channel closed");
    }

    /// Crash `run_id` after printing `text`.
    pub async fn crash(&self, run_id: RunId, text: &str) {
        self.emit(run_id, text).await;
        self.exit(run_id, 1).await;
    }
}

impl ChildSpawner for FakeSpawner {
    fn spawn(&mut self, run_id: RunId, events: mpsc::Sender<RuntimeEvent>) -> ChildHandle {
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        {
            let mut state = self.state.lock().unwrap();
            state.spawned.push(run_id);
            state.events = Some(events.clone());
        }

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    line = input_rx.recv() => match line {
                        Some(line) => state.lock().unwrap().inputs.push((run_id, line)),
                        None => break,
                    },
                    killed = &mut kill_rx => {
                        if killed.is_ok() {
                            state.lock().unwrap().killed.push(run_id);
                            let _ = events
                                .send(RuntimeEvent::ChildExited {
                                    run_id,
                                    exit: ChildExit::Exited { code: None, success: false },
                                })
                                .await;
                        }
                        break;
                    }
                }
            }
        });

        ChildHandle::new(run_id, input_tx, kill_tx)
    }
}
