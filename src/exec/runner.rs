// src/exec/runner.rs

//! Individual child process runner.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::{ChildExit, RunId, RuntimeEvent};
use crate::exec::ChildCommand;

const READ_CHUNK: usize = 8 * 1024;

/// How long to wait for the output pipes to reach EOF once the process has
/// exited. A grandchild holding the pipes open must not stall the exit.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Run one child process to completion.
///
/// Output is streamed as `ChildOutput` events; exactly one `ChildExited`
/// event follows, after the output has been drained. A kill request (or a
/// dropped handle) terminates the process and is reported through the same
/// exit event.
///
/// All errors (e.g. the program cannot be started) are delivered as an
/// output chunk describing the error followed by `ChildExit::Failed`.
pub async fn run_child(
    run_id: RunId,
    cmd: ChildCommand,
    events: mpsc::Sender<RuntimeEvent>,
    input_rx: mpsc::UnboundedReceiver<String>,
    kill_rx: oneshot::Receiver<()>,
) {
    let exit = match run_child_inner(run_id, &cmd, &events, input_rx, kill_rx).await {
        Ok(exit) => exit,
        Err(err) => {
            error!(run_id, cmd = %cmd, error = %err, "child execution error");
            let _ = events
                .send(RuntimeEvent::ChildOutput {
                    run_id,
                    bytes: format!("watchrun: {err:#}\n").into_bytes(),
                })
                .await;
            ChildExit::Failed
        }
    };

    if events
        .send(RuntimeEvent::ChildExited { run_id, exit })
        .await
        .is_err()
    {
        debug!(run_id, "supervisor gone; exit not delivered");
    }
}

async fn run_child_inner(
    run_id: RunId,
    cmd: &ChildCommand,
    events: &mpsc::Sender<RuntimeEvent>,
    input_rx: mpsc::UnboundedReceiver<String>,
    mut kill_rx: oneshot::Receiver<()>,
) -> Result<ChildExit> {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .current_dir(&cmd.cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start `{cmd}`"))?;

    info!(run_id, pid = child.id(), cmd = %cmd, "child process started");

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(run_id, stdout, events.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(run_id, stderr, events.clone()));
    }
    let writer = child
        .stdin
        .take()
        .map(|stdin| spawn_writer(run_id, stdin, input_rx));

    // Either the process exits on its own, or the supervisor asks us to stop it.
    let status = tokio::select! {
        status = child.wait() => {
            status.context("waiting for child process")?
        }

        cancel = &mut kill_rx => {
            match cancel {
                Ok(()) => info!(run_id, "kill requested; terminating child"),
                Err(_) => debug!(run_id, "child handle dropped; terminating child"),
            }
            if let Err(e) = child.start_kill() {
                warn!(run_id, error = %e, "failed to kill child process");
            }
            child.wait().await.context("waiting for killed child process")?
        }
    };

    if let Some(writer) = writer {
        writer.abort();
    }
    drain_readers(run_id, readers).await;

    info!(
        run_id,
        exit_code = ?status.code(),
        success = status.success(),
        "child process exited"
    );

    Ok(ChildExit::Exited {
        code: status.code(),
        success: status.success(),
    })
}

fn spawn_reader<R>(run_id: RunId, mut stream: R, events: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let event = RuntimeEvent::ChildOutput {
                        run_id,
                        bytes: buf[..n].to_vec(),
                    };
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(run_id, error = %e, "child output stream failed");
                    break;
                }
            }
        }
    })
}

fn spawn_writer(
    run_id: RunId,
    mut stdin: ChildStdin,
    mut input: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = input.recv().await {
            if let Err(e) = write_line(&mut stdin, &line).await {
                debug!(run_id, error = %e, "child stdin closed; dropping input");
                break;
            }
        }
    })
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}

async fn drain_readers(run_id: RunId, mut readers: Vec<JoinHandle<()>>) {
    let drained = tokio::time::timeout(OUTPUT_DRAIN_GRACE, async {
        for reader in readers.iter_mut() {
            let _ = reader.await;
        }
    })
    .await;

    if drained.is_err() {
        debug!(run_id, "output pipes still open after exit; abandoning readers");
        for reader in &readers {
            reader.abort();
        }
    }
}
