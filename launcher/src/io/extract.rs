//! Recover the generated output directory from a generation log.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::marker::{MarkerScan, resolve_marker_path, scan_marker_line};
use crate::error::LaunchError;
use crate::io::root::ProjectRoot;

/// Scan `log_path` for the first output marker and persist its absolute path.
///
/// The resolved path is written as the sole contents of
/// [`ProjectRoot::last_output_path`]. A missing log or a log without a marker
/// yields `Ok(None)`; consumers treat an absent marker file as "unknown".
#[instrument(skip_all, fields(log = %log_path.display()))]
pub fn extract_output_dir(log_path: &Path, root: &ProjectRoot) -> Result<Option<PathBuf>> {
    let Some(relative) = find_marker_in_log(log_path)? else {
        debug!("no output marker in log");
        return Ok(None);
    };

    let output_dir = resolve_marker_path(root.path(), &relative);
    write_last_output(&root.last_output_path, &output_dir)?;
    info!(output_dir = %output_dir.display(), "resolved output directory");
    Ok(Some(output_dir))
}

/// Path of the first full marker line in the log, read line by line.
fn find_marker_in_log(log_path: &Path) -> Result<Option<String>> {
    let file = match File::open(log_path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(LaunchError::filesystem("open log file", log_path, err).into()),
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("read {}", log_path.display()))?;
        if n == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        if let MarkerScan::Found(relative) = scan_marker_line(&line) {
            return Ok(relative.map(str::to_string));
        }
    }
}

fn write_last_output(path: &Path, output_dir: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| LaunchError::filesystem("create directory", parent, err))?;
    }
    fs::write(path, output_dir.to_string_lossy().as_bytes())
        .map_err(|err| LaunchError::filesystem("write output marker", path, err))?;
    Ok(())
}
