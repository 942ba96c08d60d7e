// src/entry.rs

//! Entry-point resolution.
//!
//! Priority:
//! 1. `ENTRY` given on the command line
//! 2. `entry` from the config file
//! 3. the `main` field of `package.json` in the project directory
//! 4. `index.js` in the project directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::Configuration;
use crate::errors::{Result, WatchrunError};

/// Project metadata file consulted when no entry is configured.
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Conventional entry file used when the manifest names none.
pub const DEFAULT_ENTRY: &str = "index.js";

/// The subset of `package.json` we care about.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<String>,
}

/// Pick the entry point for the supervised child.
///
/// Fails with [`WatchrunError::EntryPoint`] when none of the sources yields
/// one; the caller treats that as fatal.
pub fn resolve_entry(
    explicit: Option<&Path>,
    cfg: &Configuration,
    project_dir: &Path,
) -> Result<PathBuf> {
    if let Some(entry) = explicit {
        debug!(?entry, "entry point from command line");
        return Ok(entry.to_path_buf());
    }

    if let Some(entry) = cfg.entry() {
        debug!(?entry, "entry point from config file");
        return Ok(entry.clone());
    }

    if let Some(main) = manifest_main(project_dir)? {
        debug!(entry = %main, "entry point from {PACKAGE_MANIFEST}");
        return Ok(PathBuf::from(main));
    }

    if project_dir.join(DEFAULT_ENTRY).is_file() {
        debug!(entry = DEFAULT_ENTRY, "entry point by convention");
        return Ok(PathBuf::from(DEFAULT_ENTRY));
    }

    Err(WatchrunError::EntryPoint(format!(
        "{} has no application to run.\n\
         Pass an ENTRY, set \"main\" in {PACKAGE_MANIFEST} (e.g. via `npm init`) \
         or create an entry point file such as \"{DEFAULT_ENTRY}\".",
        project_dir.display()
    )))
}

/// Read `main` from the project's `package.json`, if the file exists.
///
/// A manifest that exists but is not valid JSON is an error; a missing file
/// or a blank `main` is not.
fn manifest_main(project_dir: &Path) -> Result<Option<String>> {
    let path = project_dir.join(PACKAGE_MANIFEST);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)?;
    let manifest: PackageManifest = serde_json::from_str(&contents)
        .map_err(|e| WatchrunError::EntryPoint(format!("invalid {}: {e}", path.display())))?;

    Ok(manifest.main.filter(|m| !m.trim().is_empty()))
}
