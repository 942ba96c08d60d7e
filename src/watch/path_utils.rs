// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again. Deleted files can't be
///   canonicalized, so their parent directory is canonicalized instead.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// Display form of a changed path: relative to `root` when possible,
/// otherwise the full path.
pub fn display_path(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| to_slash(path))
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn strips_root_prefix() {
        let root = PathBuf::from("/work/project");
        let path = root.join("src").join("main.js");
        assert_eq!(relative_str(&root, &path).as_deref(), Some("src/main.js"));
    }

    #[test]
    fn unrelated_path_falls_back_to_full_path() {
        let root = PathBuf::from("/definitely/not/here");
        let path = PathBuf::from("/elsewhere/file.txt");
        assert_eq!(relative_str(&root, &path), None);
        assert_eq!(display_path(&root, &path), "/elsewhere/file.txt");
    }
}
