//! Test-only fixtures: a scratch project layout and a scripted command runner.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::core::command::CommandSpec;
use crate::io::process::{CommandRunner, OutputSink, RunOutcome};
use crate::io::root::{ASSETS_DIR, ENTRY_POINT, ProjectRoot, SOURCE_DIR};

/// Temporary directory laid out as a project root (`miaoma.py`, `src/`, `assets/`, `tools/`).
pub struct TestProject {
    _temp: tempfile::TempDir,
    root: ProjectRoot,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().canonicalize()?;
        fs::create_dir_all(path.join(SOURCE_DIR))?;
        fs::create_dir_all(path.join(ASSETS_DIR))?;
        fs::create_dir_all(path.join("tools"))?;
        fs::write(path.join(ENTRY_POINT), "")?;
        Ok(Self {
            _temp: temp,
            root: ProjectRoot::new(path),
        })
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write `tools/project.ini`.
    pub fn write_config(&self, contents: &str) -> Result<()> {
        fs::write(&self.root.config_path, contents)?;
        Ok(())
    }

    /// Replace `miaoma.py` with a script body (run via `python3` in real use).
    pub fn write_entry_point(&self, contents: &str) -> Result<()> {
        fs::write(self.root.root.join(ENTRY_POINT), contents)?;
        Ok(())
    }
}

/// One scripted child run.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    result: std::result::Result<RunOutcome, String>,
    log: Option<String>,
}

impl ScriptedRun {
    /// Child exits with `code`; buffered sinks see empty captured output.
    pub fn exit(code: i32) -> Self {
        Self {
            result: Ok(RunOutcome {
                exit_code: Some(code),
                ..RunOutcome::default()
            }),
            log: None,
        }
    }

    /// Runner fails before the child produces an exit status.
    pub fn error(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            log: None,
        }
    }

    /// Contents written to the sink's log file, as the child would have.
    pub fn with_log(mut self, log: &str) -> Self {
        self.log = Some(log.to_string());
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        if let Ok(outcome) = &mut self.result {
            outcome.stdout = Some(stdout.to_string());
        }
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        if let Ok(outcome) = &mut self.result {
            outcome.stderr = Some(stderr.to_string());
        }
        self
    }
}

/// Recorded invocation of a [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub spec: CommandSpec,
    pub workdir: PathBuf,
    pub sink: OutputSink,
}

/// Runner that replays queued [`ScriptedRun`]s instead of spawning processes.
pub struct ScriptedRunner {
    queue: RefCell<VecDeque<ScriptedRun>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            queue: RefCell::new(runs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: CommandSpec, workdir: &Path, sink: &OutputSink) -> Result<RunOutcome> {
        self.calls.borrow_mut().push(RecordedCall {
            spec,
            workdir: workdir.to_path_buf(),
            sink: sink.clone(),
        });
        let scripted = self
            .queue
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted runner exhausted"))?;

        if let Some(log_path) = sink.log_path() {
            fs::write(log_path, scripted.log.as_deref().unwrap_or(""))?;
        }

        let mut outcome = scripted.result.map_err(|message| anyhow!(message))?;
        match sink {
            OutputSink::Buffered => {
                outcome.stdout.get_or_insert_with(String::new);
                outcome.stderr.get_or_insert_with(String::new);
            }
            OutputSink::Tee(path) | OutputSink::Redirect(path) => {
                outcome.log_path = Some(path.clone());
            }
            OutputSink::Inherit => {}
        }
        Ok(outcome)
    }
}
