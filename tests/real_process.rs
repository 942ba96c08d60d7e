// tests/real_process.rs

//! Runs real child processes through `sh`, and through `node` when it is
//! installed.

#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use watchrun::config::Configuration;
use watchrun::engine::{ChildExit, RuntimeEvent};
use watchrun::entry::resolve_entry;
use watchrun::exec::{ChildCommand, ChildSpawner, RealSpawner};

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> ChildCommand {
    ChildCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        cwd: std::env::temp_dir(),
    }
}

/// Collect output until the exit event arrives.
async fn collect_run(rx: &mut mpsc::Receiver<RuntimeEvent>) -> (String, ChildExit) {
    let mut output = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("child did not finish")
            .expect("channel closed");
        match event {
            RuntimeEvent::ChildOutput { bytes, .. } => output.extend_from_slice(&bytes),
            RuntimeEvent::ChildExited { exit, .. } => {
                return (String::from_utf8_lossy(&output).into_owned(), exit);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn output_arrives_before_exit() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(64);
    let mut spawner = RealSpawner::new(sh("echo out; echo err >&2; exit 3"));

    let _handle = spawner.spawn(1, tx);
    let (output, exit) = collect_run(&mut rx).await;

    assert!(output.contains("out\n"));
    assert!(output.contains("err\n"));
    assert_eq!(exit, ChildExit::Exited { code: Some(3), success: false });
    Ok(())
}

#[tokio::test]
async fn kill_terminates_a_long_running_child() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(64);
    let mut spawner = RealSpawner::new(sh("echo ready; sleep 30"));

    let mut handle = spawner.spawn(2, tx);
    match timeout(Duration::from_secs(10), rx.recv()).await? {
        Some(RuntimeEvent::ChildOutput { bytes, .. }) => assert_eq!(bytes, b"ready\n"),
        other => panic!("expected output, got {other:?}"),
    }

    assert!(handle.kill());
    let (_, exit) = collect_run(&mut rx).await;
    assert!(!exit.success());
    Ok(())
}

#[tokio::test]
async fn stdin_lines_reach_the_child() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(64);
    let mut spawner = RealSpawner::new(sh("read line; echo \"got $line\""));

    let handle = spawner.spawn(3, tx);
    assert!(handle.send_input("{\"kind\":\"modified\"}\n".to_string()));

    let (output, exit) = collect_run(&mut rx).await;
    assert_eq!(output, "got {\"kind\":\"modified\"}\n");
    assert!(exit.success());
    Ok(())
}

#[tokio::test]
async fn missing_program_fails_through_the_exit_path() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(64);
    let cmd = ChildCommand {
        program: "/definitely/not/a/program".to_string(),
        args: Vec::new(),
        cwd: std::env::temp_dir(),
    };

    let _handle = RealSpawner::new(cmd).spawn(4, tx);
    let (output, exit) = collect_run(&mut rx).await;

    assert!(output.contains("failed to start"));
    assert_eq!(exit, ChildExit::Failed);
    Ok(())
}

#[tokio::test]
async fn dropping_the_handle_stops_the_child() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(64);
    let handle = RealSpawner::new(sh("sleep 30")).spawn(5, tx);
    drop(handle);

    let (_, exit) = collect_run(&mut rx).await;
    assert!(!exit.success());
    Ok(())
}

#[tokio::test]
async fn executable_entry_runs_from_the_project_directory() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("serve");
    std::fs::write(&script, "#!/bin/sh\necho \"serving $1\"\n")?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let cmd = ChildCommand::new(&[], Path::new("serve"), &["app".to_string()], dir.path());
    let (tx, mut rx) = mpsc::channel(64);
    let _handle = RealSpawner::new(cmd).spawn(6, tx);

    let (output, exit) = collect_run(&mut rx).await;
    assert_eq!(output, "serving app\n");
    assert!(exit.success());
    Ok(())
}

#[tokio::test]
async fn package_main_starts_under_node() -> TestResult {
    let has_node = std::process::Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success());
    if !has_node {
        eprintln!("node not installed; skipping");
        return Ok(());
    }

    init_tracing();
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("package.json"), r#"{"main":"index.js"}"#)?;
    std::fs::write(dir.path().join("index.js"), "console.log('up ' + process.argv[2]);\n")?;

    let cfg = Configuration::default();
    let entry = resolve_entry(None, &cfg, dir.path())?;
    let cmd = ChildCommand::new(cfg.command(), &entry, &["3000".to_string()], dir.path());

    let (tx, mut rx) = mpsc::channel(64);
    let _handle = RealSpawner::new(cmd).spawn(7, tx);

    let (output, exit) = collect_run(&mut rx).await;
    assert_eq!(output, "up 3000\n");
    assert!(exit.success());
    Ok(())
}
