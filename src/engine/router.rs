// src/engine/router.rs

//! Turns classified filesystem changes into supervisor decisions.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind, Classification};
use crate::watch::path_utils::display_path;
use crate::watch::PathClassifier;

/// Change notification written to the child's stdin for live reloads.
///
/// Wire format: one JSON object per line, e.g.
///
/// ```json
/// {"kind":"modified","path":"public/index.html","timestamp":"2026-10-19T10:00:00.123Z"}
/// ```
///
/// `path` is relative to the working directory when the change lies below
/// it, otherwise absolute. `timestamp` is RFC 3339 in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChange {
    pub kind: ChangeKind,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl WireChange {
    /// Serialize as a single `\n`-terminated line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// What to do about one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignored,
    /// Announce, then forward to the running child.
    Live { description: String, change: WireChange },
    /// Announce, then kill the running child so it restarts.
    Restart { description: String },
}

/// Classifies changes relative to a project root.
#[derive(Debug, Clone)]
pub struct ChangeRouter {
    classifier: PathClassifier,
    root: PathBuf,
}

impl ChangeRouter {
    pub fn new(classifier: PathClassifier, root: impl Into<PathBuf>) -> Self {
        Self {
            classifier,
            root: root.into(),
        }
    }

    pub fn from_config(cfg: &Configuration, root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(PathClassifier::from_config(cfg)?, root))
    }

    pub fn route(&self, change: &ChangeEvent) -> Route {
        let path = display_path(&self.root, &change.path);

        match self.classifier.classify(&path) {
            Classification::Ignored => Route::Ignored,
            Classification::Live => Route::Live {
                description: describe(change, &path),
                change: WireChange {
                    kind: change.kind,
                    path,
                    timestamp: change.timestamp,
                },
            },
            Classification::Restart => Route::Restart {
                description: describe(change, &path),
            },
        }
    }
}

/// Human-readable change line, e.g. `[14:03:27] modified src/server.js`.
pub fn describe(change: &ChangeEvent, display: &str) -> String {
    let local = change.timestamp.with_timezone(&Local);
    format!(
        "[{}] {} {}",
        local.format("%H:%M:%S"),
        change.kind.verb(),
        display
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::PatternMatcher;

    fn router() -> ChangeRouter {
        let classifier = PathClassifier::new(
            PatternMatcher::compile(&["*.log"]).unwrap(),
            PatternMatcher::compile(&["public"]).unwrap(),
        );
        ChangeRouter::new(classifier, "/work/app")
    }

    #[test]
    fn routes_by_classification() {
        let router = router();

        let ignored = ChangeEvent::new(ChangeKind::Modified, "/work/app/public/app.log");
        assert_eq!(router.route(&ignored), Route::Ignored);

        let live = ChangeEvent::new(ChangeKind::Modified, "/work/app/public/index.html");
        match router.route(&live) {
            Route::Live { description, change } => {
                assert!(description.ends_with("modified public/index.html"));
                assert_eq!(change.path, "public/index.html");
                assert_eq!(change.kind, ChangeKind::Modified);
            }
            other => panic!("expected live route, got {other:?}"),
        }

        let restart = ChangeEvent::new(ChangeKind::Created, "/work/app/src/server.js");
        match router.route(&restart) {
            Route::Restart { description } => {
                assert!(description.ends_with("created src/server.js"));
            }
            other => panic!("expected restart route, got {other:?}"),
        }
    }

    #[test]
    fn wire_change_is_one_json_line() {
        let wire = WireChange {
            kind: ChangeKind::Deleted,
            path: "public/a.css".to_string(),
            timestamp: Utc::now(),
        };
        let line = wire.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["kind"], "deleted");
        assert_eq!(value["path"], "public/a.css");

        let back: WireChange = serde_json::from_str(&line).unwrap();
        assert_eq!(back, wire);
    }
}
