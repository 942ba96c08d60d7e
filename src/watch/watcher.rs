// src/watch/watcher.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind, WatchBackend};

/// What to watch and how.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub dirs: Vec<PathBuf>,
    /// Skip the native backend probe and poll right away.
    pub force_poll: bool,
    pub poll_interval: Duration,
}

impl WatchOptions {
    pub fn from_config(cfg: &Configuration) -> Self {
        Self {
            dirs: cfg.watch_dirs().to_vec(),
            force_poll: cfg.force_poll(),
            poll_interval: cfg.poll_interval(),
        }
    }
}

/// Result of probing the native (push-based) watch backend.
pub enum BackendProbe {
    /// The backend was created and is already watching every directory.
    Available(RecommendedWatcher),
    /// The backend could not be set up; the reason is informational only.
    Unavailable(String),
}

impl fmt::Debug for BackendProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendProbe::Available(_) => f.write_str("Available"),
            BackendProbe::Unavailable(reason) => {
                f.debug_tuple("Unavailable").field(reason).finish()
            }
        }
    }
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying notify watcher alive. Dropping this handle stops
/// file watching; events already in flight are not drained.
pub struct WatcherHandle {
    _inner: Box<dyn Watcher + Send>,
    backend: WatchBackend,
}

impl WatcherHandle {
    /// Backend that ended up serving this watcher.
    pub fn backend(&self) -> WatchBackend {
        self.backend
    }
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

type RawEventSender = mpsc::UnboundedSender<notify::Result<Event>>;

/// Closure called synchronously by notify whenever an event arrives. It only
/// forwards; interpretation happens on the async side where we can log.
fn forwarder(tx: RawEventSender) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |res: notify::Result<Event>| {
        // The receiver only goes away when the watcher is shutting down.
        let _ = tx.send(res);
    }
}

/// Try to set up the OS push-based backend on every directory.
///
/// Any failure (unsupported platform, exhausted inotify watches, ...) yields
/// `Unavailable`; the caller decides what to fall back to.
pub fn probe_native<F>(dirs: &[PathBuf], handler: F) -> BackendProbe
where
    F: FnMut(notify::Result<Event>) + Send + 'static,
{
    let mut watcher = match RecommendedWatcher::new(handler, Config::default()) {
        Ok(w) => w,
        Err(err) => return BackendProbe::Unavailable(err.to_string()),
    };

    for dir in dirs {
        if let Err(err) = watcher.watch(dir, RecursiveMode::Recursive) {
            return BackendProbe::Unavailable(format!("watching {:?}: {err}", dir));
        }
    }

    BackendProbe::Available(watcher)
}

fn start_polling(
    dirs: &[PathBuf],
    interval: Duration,
    tx: RawEventSender,
) -> Result<PollWatcher> {
    let mut watcher = PollWatcher::new(
        forwarder(tx),
        Config::default().with_poll_interval(interval),
    )?;
    for dir in dirs {
        watcher.watch(dir, RecursiveMode::Recursive)?;
    }
    Ok(watcher)
}

/// Spawn a filesystem watcher over `options.dirs` that sends
/// `RuntimeEvent::FileChanged` into the runtime for every change.
///
/// The native backend is preferred; if it is unavailable the watcher silently
/// falls back to polling. Only a failure to set up the polling backend itself
/// is returned as an error.
pub fn spawn_watcher(
    options: WatchOptions,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Canonicalize once so we have stable base paths.
    let dirs: Vec<PathBuf> = options
        .dirs
        .iter()
        .map(|d| d.canonicalize().unwrap_or_else(|_| d.clone()))
        .collect();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let probe = if options.force_poll {
        BackendProbe::Unavailable("polling requested by configuration".to_string())
    } else {
        probe_native(&dirs, forwarder(event_tx.clone()))
    };

    let handle = match probe {
        BackendProbe::Available(watcher) => WatcherHandle {
            _inner: Box::new(watcher),
            backend: WatchBackend::Native,
        },
        BackendProbe::Unavailable(reason) => {
            info!(%reason, "native file watching unavailable; falling back to polling");
            let watcher = start_polling(&dirs, options.poll_interval, event_tx)?;
            WatcherHandle {
                _inner: Box::new(watcher),
                backend: WatchBackend::Poll,
            }
        }
    };

    info!(backend = ?handle.backend, ?dirs, "file watcher started");

    tokio::spawn(async move {
        while let Some(res) = event_rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "dropping malformed file watch event");
                    continue;
                }
            };

            debug!(?event, "received notify event");

            for change in changes_from_event(event) {
                if runtime_tx.send(RuntimeEvent::FileChanged(change)).await.is_err() {
                    debug!("runtime channel closed; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(handle)
}

/// Map a notify event kind onto our normalized change kinds.
///
/// Pure access events (open/read/close) are not changes and map to `None`.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Any | EventKind::Other => Some(ChangeKind::Unknown),
        EventKind::Access(_) => None,
    }
}

/// Split one notify event into one `ChangeEvent` per affected path.
pub fn changes_from_event(event: Event) -> Vec<ChangeEvent> {
    let Some(kind) = change_kind(&event.kind) else {
        return Vec::new();
    };

    if event.paths.is_empty() {
        debug!(kind = ?event.kind, "dropping watch event without paths");
        return Vec::new();
    }

    event
        .paths
        .into_iter()
        .map(|path| ChangeEvent::new(kind, path))
        .collect()
}
