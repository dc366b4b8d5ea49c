//! The output-directory marker line emitted by the generation tool.
//!
//! This line is the only structured data the tool reports back:
//!
//! ```text
//! [MIAOMA_OUTPUT_DIR] 输出目录: <relative-path>
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Substring that flags a candidate marker line.
pub const MARKER_TAG: &str = "[MIAOMA_OUTPUT_DIR]";

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[MIAOMA_OUTPUT_DIR\] 输出目录: (.+)").unwrap());

/// Outcome of scanning one log line for the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerScan<'a> {
    /// Not a full marker line; keep scanning.
    Continue,
    /// First full marker line, with its trimmed path. A blank path ends the
    /// scan with no result.
    Found(Option<&'a str>),
}

/// Classify one log line. The first [`MarkerScan::Found`] ends a scan; later
/// markers are ignored.
///
/// Lines without the tag, or with the tag but not the full marker shape, are
/// [`MarkerScan::Continue`].
pub fn scan_marker_line(line: &str) -> MarkerScan<'_> {
    let line = line.trim_end_matches(['\n', '\r']);
    if !line.contains(MARKER_TAG) {
        return MarkerScan::Continue;
    }
    match MARKER_RE.captures(line).and_then(|caps| caps.get(1)) {
        None => MarkerScan::Continue,
        Some(path) => {
            let path = path.as_str().trim();
            MarkerScan::Found((!path.is_empty()).then_some(path))
        }
    }
}

/// Join a marker path onto the project root.
pub fn resolve_marker_path(root: &Path, relative: &str) -> PathBuf {
    root.join(relative)
}
