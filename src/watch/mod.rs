// src/watch/mod.rs

//! File watching and change classification.
//!
//! This module is responsible for:
//! - Compiling `ignore` / `live` patterns and classifying changed paths.
//! - Wiring up a cross-platform filesystem watcher (`notify`), preferring the
//!   native backend and falling back to polling.
//!
//! It does **not** know about the supervised process; it only turns
//! filesystem changes into `RuntimeEvent::FileChanged`.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{PathClassifier, PatternMatcher, classify, normalize};
pub use watcher::{BackendProbe, WatchOptions, WatcherHandle, probe_native, spawn_watcher};
