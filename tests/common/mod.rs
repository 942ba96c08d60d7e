#![allow(dead_code)]

pub use watchrun_test_utils::builders;
pub use watchrun_test_utils::capture::SharedBuffer;
pub use watchrun_test_utils::fake_spawner::FakeSpawner;
pub use watchrun_test_utils::{init_tracing, wait_until, with_timeout};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use watchrun::config::Configuration;
use watchrun::engine::{ChangeRouter, RuntimeEvent, Supervisor, SupervisorCore};
use watchrun::output::DirectSink;

/// Project root used by the fake-spawner tests.
pub const ROOT: &str = "/work/app";

/// A supervisor running on a fake spawner, plus the handles to drive it.
pub struct Harness {
    pub tx: mpsc::Sender<RuntimeEvent>,
    pub spawner: FakeSpawner,
    pub out: SharedBuffer,
    pub task: JoinHandle<watchrun::errors::Result<()>>,
}

impl Harness {
    /// Start a supervisor over `cfg` rooted at [`ROOT`]. The first child is
    /// spawned right away.
    pub fn start(cfg: &Configuration) -> Self {
        init_tracing();

        let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
        let router = ChangeRouter::from_config(cfg, ROOT).expect("router from config");
        let out = SharedBuffer::new();
        let core = SupervisorCore::new(cfg, router, DirectSink::new(out.clone()));
        let spawner = FakeSpawner::new();

        let supervisor = Supervisor::new(core, tx.clone(), rx, spawner.clone());
        let task = tokio::spawn(supervisor.run());

        Self {
            tx,
            spawner,
            out,
            task,
        }
    }

    /// Wait until the `n`-th run has been spawned and return its id.
    pub async fn run_number(&self, n: usize) -> u64 {
        let spawner = self.spawner.clone();
        with_timeout(wait_until(move || spawner.spawn_count() >= n)).await;
        self.spawner.spawned()[n - 1]
    }

    pub async fn send(&self, event: RuntimeEvent) {
        self.tx.send(event).await.expect("supervisor channel closed");
    }
}
