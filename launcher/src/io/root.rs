//! Project root discovery and the canonical paths derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::error::LaunchError;

/// Entry-point file that must sit directly under the root.
pub const ENTRY_POINT: &str = "miaoma.py";
/// Source directory that must exist under the root.
pub const SOURCE_DIR: &str = "src";
/// Assets directory that must exist under the root.
pub const ASSETS_DIR: &str = "assets";

/// Located project root plus every path the workflows resolve against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub temp_log_path: PathBuf,
    pub last_output_path: PathBuf,
}

impl ProjectRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let tools_dir = root.join("tools");
        Self {
            root: root.clone(),
            config_path: tools_dir.join("project.ini"),
            temp_log_path: tools_dir.join(".temp_gen.log"),
            last_output_path: tools_dir.join(".last_output_dir"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the root unless it is already absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// True when `dir` has the entry point, `src/` and `assets/`.
pub fn is_project_root(dir: &Path) -> bool {
    dir.join(ENTRY_POINT).exists()
        && dir.join(SOURCE_DIR).is_dir()
        && dir.join(ASSETS_DIR).is_dir()
}

/// Walk upward from `start` to the first directory passing [`is_project_root`].
///
/// Relative `start` paths are made absolute against the current directory.
/// The walk ends at the filesystem root, so it always terminates.
#[instrument(skip_all, fields(start = %start.display()))]
pub fn locate_project_root(start: &Path) -> Result<ProjectRoot> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .context("read current directory")?
            .join(start)
    };

    for candidate in start.ancestors() {
        debug!(candidate = %candidate.display(), "checking for project root");
        if is_project_root(candidate) {
            info!(root = %candidate.display(), "found project root");
            return Ok(ProjectRoot::new(candidate));
        }
    }

    Err(LaunchError::RootNotFound { start }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_root(dir: &Path) {
        fs::create_dir_all(dir.join(SOURCE_DIR)).expect("create src");
        fs::create_dir_all(dir.join(ASSETS_DIR)).expect("create assets");
        fs::write(dir.join(ENTRY_POINT), "").expect("write entry point");
    }

    #[test]
    fn project_paths_are_stable() {
        let root = ProjectRoot::new("/proj");
        assert_eq!(root.config_path, Path::new("/proj/tools/project.ini"));
        assert_eq!(root.temp_log_path, Path::new("/proj/tools/.temp_gen.log"));
        assert_eq!(root.last_output_path, Path::new("/proj/tools/.last_output_dir"));
        assert_eq!(root.resolve("out"), Path::new("/proj/out"));
        assert_eq!(root.resolve("/abs/out"), Path::new("/abs/out"));
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_root(temp.path());
        let nested = temp.path().join("tools").join("scripts");
        fs::create_dir_all(&nested).expect("create nested");

        let located = locate_project_root(&nested).expect("locate");
        assert_eq!(located.root, temp.path());
    }

    #[test]
    fn nearest_qualifying_ancestor_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_root(temp.path());
        let inner = temp.path().join("vendor").join("inner");
        make_root(&inner);

        let located = locate_project_root(&inner.join(SOURCE_DIR)).expect("locate");
        assert_eq!(located.root, inner);
    }

    #[test]
    fn partial_marker_does_not_qualify() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(ENTRY_POINT), "").expect("write entry point");
        fs::create_dir_all(temp.path().join(SOURCE_DIR)).expect("create src");
        // assets exists but is a file, not a directory
        fs::write(temp.path().join(ASSETS_DIR), "").expect("write assets file");

        assert!(!is_project_root(temp.path()));
    }

    #[test]
    fn missing_root_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = locate_project_root(temp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::RootNotFound { .. })
        ));
    }
}
