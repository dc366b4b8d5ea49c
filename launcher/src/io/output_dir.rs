//! Output directory preparation for the gen workflow.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::error::LaunchError;
use crate::io::root::ProjectRoot;

/// Paths touched while preparing a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Artifacts left by a previous run under the output directory.
    pub artifacts_dir: PathBuf,
    /// Derived configuration left by a previous run under the project path.
    pub project_config_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &ProjectRoot, output: &Path, project_path: &str) -> Self {
        let output_dir = root.resolve(output);
        Self {
            artifacts_dir: output_dir.join("miaoma").join("artifacts"),
            project_config_dir: root.resolve(project_path).join("config"),
            output_dir,
        }
    }
}

/// Create the output directory and clear stale artifacts from earlier runs.
///
/// Directories created here are not rolled back if the run later fails.
pub fn prepare_output_dir(layout: &OutputLayout) -> Result<()> {
    info!(output_dir = %layout.output_dir.display(), "output directory");
    if layout.output_dir.exists() {
        info!("output directory already exists");
    } else {
        info!("creating output directory");
        fs::create_dir_all(&layout.output_dir).map_err(|err| {
            LaunchError::filesystem("create output directory", &layout.output_dir, err)
        })?;
    }

    remove_stale_dir(&layout.artifacts_dir)?;
    remove_stale_dir(&layout.project_config_dir)?;
    Ok(())
}

fn remove_stale_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    info!(path = %path.display(), "removing stale files");
    fs::remove_dir_all(path)
        .map_err(|err| LaunchError::filesystem("remove stale directory", path, err))?;
    Ok(())
}
