//! Orchestration for `miaoma dump`.
//!
//! Quiet runs buffer the tool's output and print stdout once after a
//! successful exit; on failure only stderr is surfaced. With
//! `SHOW_PYTHON_LOGS=true` the tool writes straight to the terminal.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::core::command::{DUMP_REQUIRED, DumpOptions, build_dump_command};
use crate::error::LaunchError;
use crate::io::config::{load_settings, log_settings};
use crate::io::process::{CommandRunner, OutputSink, RunOutcome};
use crate::io::root::ProjectRoot;

/// Run the dump workflow rooted at `root`, printing captured stdout to `out`.
pub fn run_dump<R: CommandRunner, W: Write>(
    root: &ProjectRoot,
    options: &DumpOptions,
    runner: &R,
    out: &mut W,
) -> Result<RunOutcome> {
    let settings = load_settings(&root.config_path, DUMP_REQUIRED)?;
    log_settings(&settings);

    info!(table = options.table(), "starting table dump");
    let spec = build_dump_command(&settings, options);
    let show_logs = settings.show_logs();
    if show_logs {
        info!(command = %spec, "running command");
    } else {
        debug!(command = %spec, "running command");
    }

    let sink = if show_logs {
        OutputSink::Inherit
    } else {
        OutputSink::Buffered
    };
    let command = spec.to_string();
    let run = runner.run(spec, root.path(), &sink)?;

    if !run.success() {
        error!(status = %run.status_label(), "table dump failed");
        if !show_logs {
            info!("hint: set SHOW_PYTHON_LOGS=true in project.ini to see the tool output");
            if let Some(stderr) = run.stderr.as_deref().filter(|s| !s.is_empty()) {
                error!("tool error output:\n{}", stderr.trim_end());
            }
        }
        return Err(LaunchError::ProcessFailure {
            command,
            status: run.status_label(),
        }
        .into());
    }

    if let Some(stdout) = run.stdout.as_deref().filter(|s| !s.is_empty()) {
        out.write_all(stdout.as_bytes())
            .and_then(|()| out.flush())
            .context("write dump output")?;
    }
    info!("table dump complete");
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::DumpFormat;
    use crate::test_support::{ScriptedRun, ScriptedRunner, TestProject};

    #[test]
    fn quiet_success_prints_stdout_once() {
        let project = TestProject::new().expect("project");
        project
            .write_config("MIAOMA_CONFIG_PROJECT_PATH=projects/demo\n")
            .expect("config");
        let runner = ScriptedRunner::new(vec![
            ScriptedRun::exit(0)
                .with_stdout("table.sql.name=t_orders\n")
                .with_stderr("debug chatter\n"),
        ]);
        let mut out = Vec::new();

        run_dump(project.root(), &DumpOptions::default(), &runner, &mut out).expect("dump");

        assert_eq!(String::from_utf8(out).expect("utf8"), "table.sql.name=t_orders\n");
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sink, OutputSink::Buffered);
        assert_eq!(calls[0].workdir, project.root().root);
    }

    #[test]
    fn quiet_failure_does_not_print_stdout() {
        let project = TestProject::new().expect("project");
        project
            .write_config("MIAOMA_CONFIG_PROJECT_PATH=projects/demo\n")
            .expect("config");
        let runner = ScriptedRunner::new(vec![
            ScriptedRun::exit(1)
                .with_stdout("partial\n")
                .with_stderr("table not found\n"),
        ]);
        let mut out = Vec::new();

        let err = run_dump(project.root(), &DumpOptions::default(), &runner, &mut out).unwrap_err();

        assert!(out.is_empty());
        match err.downcast_ref::<LaunchError>() {
            Some(LaunchError::ProcessFailure { command, status }) => {
                assert!(command.contains("dump-table-meta"));
                assert_eq!(status, "exit code 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn show_logs_inherits_terminal() {
        let project = TestProject::new().expect("project");
        project
            .write_config("MIAOMA_CONFIG_PROJECT_PATH=p\nSHOW_PYTHON_LOGS=true\n")
            .expect("config");
        let runner = ScriptedRunner::new(vec![ScriptedRun::exit(0)]);
        let options = DumpOptions {
            table: Some("t_orders".to_string()),
            format: Some(DumpFormat::Json),
            verbose: true,
            ..DumpOptions::default()
        };
        let mut out = Vec::new();

        run_dump(project.root(), &options, &runner, &mut out).expect("dump");

        let calls = runner.calls();
        assert_eq!(calls[0].sink, OutputSink::Inherit);
        assert_eq!(
            calls[0].spec.to_string(),
            "python3 miaoma.py dump-table-meta --project-dir p -n t_orders --format json --verbose"
        );
        assert!(out.is_empty());
    }

    #[test]
    fn empty_project_path_never_starts_child() {
        let project = TestProject::new().expect("project");
        project
            .write_config("MIAOMA_CONFIG_PROJECT_PATH=\nMIAOMA_DATABASE_FILE=db.sql\n")
            .expect("config");
        let runner = ScriptedRunner::new(vec![ScriptedRun::exit(0)]);
        let mut out = Vec::new();

        let err = run_dump(project.root(), &DumpOptions::default(), &runner, &mut out).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::ConfigKeyMissing { .. })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let project = TestProject::new().expect("project");
        let runner = ScriptedRunner::new(Vec::new());
        let mut out = Vec::new();

        let err = run_dump(project.root(), &DumpOptions::default(), &runner, &mut out).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::ConfigMissing { .. })
        ));
    }
}
