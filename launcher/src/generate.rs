//! Orchestration for `miaoma gen`.
//!
//! Loads settings, selects the generation sub-command from `TOOL_MODE`, clears
//! stale output, runs the tool with its combined output going to a temporary
//! log, then recovers the output directory from that log. The temporary log is
//! removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::core::command::{GEN_REQUIRED, build_gen_command};
use crate::core::settings::SettingKey;
use crate::error::LaunchError;
use crate::io::config::{load_settings, log_settings};
use crate::io::extract::extract_output_dir;
use crate::io::output_dir::{OutputLayout, prepare_output_dir};
use crate::io::process::{CommandRunner, OutputSink, RunOutcome};
use crate::io::root::ProjectRoot;

/// Caller options for `miaoma gen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenRequest {
    /// Output directory; relative paths resolve against the project root.
    pub output: PathBuf,
}

/// Outcome of a successful generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOutcome {
    /// Absolute output directory the caller asked for.
    pub output_dir: PathBuf,
    /// Child run result, including the directory the tool reported, if any.
    pub run: RunOutcome,
}

/// Removes the temporary log when dropped.
struct TempLog<'a> {
    path: &'a Path,
}

impl Drop for TempLog<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary log"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(err = %err, path = %self.path.display(), "failed to remove temporary log"),
        }
    }
}

/// Run the gen workflow rooted at `root`.
pub fn run_gen<R: CommandRunner>(
    root: &ProjectRoot,
    request: &GenRequest,
    runner: &R,
) -> Result<GenOutcome> {
    // Also sweeps a log left behind by an interrupted earlier run.
    let _temp_log = TempLog {
        path: &root.temp_log_path,
    };
    let settings = load_settings(&root.config_path, GEN_REQUIRED)?;
    log_settings(&settings);

    let (mode, spec) = build_gen_command(&settings)?;

    let layout = OutputLayout::new(
        root,
        &request.output,
        settings.get_or_empty(SettingKey::ProjectPath),
    );
    prepare_output_dir(&layout)?;

    info!("starting code generation");
    info!("using {} ({})", mode.subcommand(), mode.describe());
    info!(command = %spec, "running command");

    let show_logs = settings.show_logs();
    let sink = if show_logs {
        OutputSink::Tee(root.temp_log_path.clone())
    } else {
        OutputSink::Redirect(root.temp_log_path.clone())
    };

    let command = spec.to_string();
    let mut run = runner.run(spec, root.path(), &sink)?;

    if !run.success() {
        error!(status = %run.status_label(), "code generation failed");
        if !show_logs {
            info!("hint: set SHOW_PYTHON_LOGS=true in project.ini to see the tool output");
        }
        return Err(LaunchError::ProcessFailure {
            command,
            status: run.status_label(),
        }
        .into());
    }

    run.output_dir = extract_output_dir(&root.temp_log_path, root)?;
    info!("code generation complete");
    info!(output_dir = %layout.output_dir.display(), "generated code written");

    Ok(GenOutcome {
        output_dir: layout.output_dir,
        run,
    })
}
