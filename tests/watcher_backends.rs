// tests/watcher_backends.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use watchrun::engine::RuntimeEvent;
use watchrun::types::WatchBackend;
use watchrun::watch::{spawn_watcher, BackendProbe, WatchOptions, probe_native};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn forced_polling_reports_new_files() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = mpsc::channel(64);

    let options = WatchOptions {
        dirs: vec![dir.path().to_path_buf()],
        force_poll: true,
        poll_interval: Duration::from_millis(50),
    };
    let handle = spawn_watcher(options, tx)?;
    assert_eq!(handle.backend(), WatchBackend::Poll);

    // Give the poller its initial scan before changing anything.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(dir.path().join("server.js"), "console.log(1)")?;

    let change = timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::FileChanged(change)) if change.path.ends_with("server.js") => {
                    return change;
                }
                Some(_) => continue,
                None => panic!("watcher channel closed"),
            }
        }
    })
    .await?;

    assert!(change.path.is_absolute());
    Ok(())
}

#[test]
fn probe_reports_unavailable_for_missing_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist");

    let probe = probe_native(&[missing], |_| {});
    assert!(matches!(probe, BackendProbe::Unavailable(_)), "got {probe:?}");
}
