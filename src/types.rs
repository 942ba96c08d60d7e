use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a filesystem change should be handled.
///
/// Classification order is fixed: `Ignored` wins over `Live`, and anything
/// that is neither falls through to `Restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ignored,
    Live,
    Restart,
}

/// Normalized kind of a filesystem change, independent of the watch backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
    Unknown,
}

impl ChangeKind {
    /// Past-tense verb used in the human-readable change line.
    pub fn verb(self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Unknown => "changed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(ChangeKind::Created),
            "modified" => Ok(ChangeKind::Modified),
            "deleted" => Ok(ChangeKind::Deleted),
            "renamed" => Ok(ChangeKind::Renamed),
            "unknown" => Ok(ChangeKind::Unknown),
            other => Err(format!("invalid change kind: {other}")),
        }
    }
}

/// A single filesystem change as reported by the watcher.
///
/// `path` is absolute (as delivered by the backend); the router turns it into
/// a working-directory-relative form for classification and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Which watch backend ended up serving the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchBackend {
    /// OS push notifications (inotify, FSEvents, ReadDirectoryChangesW, ...).
    Native,
    /// Periodic recursive directory scans.
    Poll,
}
