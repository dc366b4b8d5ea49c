//! Child process execution behind a single output-sink abstraction.
//!
//! Every run blocks until the child exits; there is no timeout. The child is
//! spawned in the launcher's process group with the project root as its
//! working directory, so a terminal interrupt reaches it as well.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};

use crate::core::command::CommandSpec;
use crate::error::LaunchError;

/// Where the child's stdout/stderr go while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Child writes straight to the launcher's terminal.
    Inherit,
    /// stdout and stderr are captured in memory and returned after exit.
    Buffered,
    /// Combined output is relayed line by line to the terminal and the log file.
    Tee(PathBuf),
    /// Combined output is redirected into the log file with no terminal echo.
    Redirect(PathBuf),
}

impl OutputSink {
    pub fn label(&self) -> &'static str {
        match self {
            OutputSink::Inherit => "inherit",
            OutputSink::Buffered => "buffered",
            OutputSink::Tee(_) => "tee",
            OutputSink::Redirect(_) => "redirect",
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        match self {
            OutputSink::Tee(path) | OutputSink::Redirect(path) => Some(path),
            OutputSink::Inherit | OutputSink::Buffered => None,
        }
    }
}

/// Result of one child process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code, or `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout ([`OutputSink::Buffered`] only).
    pub stdout: Option<String>,
    /// Captured stderr ([`OutputSink::Buffered`] only).
    pub stderr: Option<String>,
    /// Log file holding combined output ([`OutputSink::Tee`] / [`OutputSink::Redirect`]).
    pub log_path: Option<PathBuf>,
    /// Output directory recovered from the log (gen workflow only).
    pub output_dir: Option<PathBuf>,
}

impl RunOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable exit description, e.g. `exit code 2`.
    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Abstraction over child process execution. Tests use scripted runners.
pub trait CommandRunner {
    /// Run `spec` in `workdir` and block until it exits.
    ///
    /// A non-zero exit is reported through [`RunOutcome::success`], not as an
    /// error; errors mean the child could not be run or its output not handled.
    fn run(&self, spec: CommandSpec, workdir: &Path, sink: &OutputSink) -> Result<RunOutcome>;
}

/// Runner that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(program = spec.program(), sink = sink.label()))]
    fn run(&self, spec: CommandSpec, workdir: &Path, sink: &OutputSink) -> Result<RunOutcome> {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.args())
            .current_dir(workdir)
            .stdin(Stdio::null());

        let outcome = match sink {
            OutputSink::Inherit => run_inherit(cmd, spec.program())?,
            OutputSink::Buffered => run_buffered(cmd, spec.program())?,
            OutputSink::Tee(log_path) => {
                let stdout = std::io::stdout();
                let mut echo = stdout.lock();
                run_tee(cmd, spec.program(), log_path, &mut echo)?
            }
            OutputSink::Redirect(log_path) => run_redirect(cmd, spec.program(), log_path)?,
        };

        debug!(exit_code = ?outcome.exit_code, "command finished");
        Ok(outcome)
    }
}

fn spawn(cmd: &mut Command, program: &str) -> Result<std::process::Child> {
    debug!("spawning child process");
    cmd.spawn().map_err(|err| {
        error!(err = %err, "failed to spawn command");
        LaunchError::filesystem("spawn", program, err).into()
    })
}

fn run_inherit(mut cmd: Command, program: &str) -> Result<RunOutcome> {
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    let mut child = spawn(&mut cmd, program)?;
    let status = child.wait().context("wait for command")?;
    Ok(RunOutcome::from_status(status))
}

/// Capture stdout/stderr in full without risking pipe deadlocks.
///
/// Both pipes are drained concurrently while the child runs.
fn run_buffered(mut cmd: Command, program: &str) -> Result<RunOutcome> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = spawn(&mut cmd, program)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream(stdout));
    let stderr_handle = thread::spawn(move || read_stream(stderr));

    let status = child.wait().context("wait for command")?;
    let stdout = join_reader(stdout_handle).context("join stdout")?;
    let stderr = join_reader(stderr_handle).context("join stderr")?;

    Ok(RunOutcome {
        stdout: Some(String::from_utf8_lossy(&stdout).into_owned()),
        stderr: Some(String::from_utf8_lossy(&stderr).into_owned()),
        ..RunOutcome::from_status(status)
    })
}

/// Redirect both streams into `log_path` (truncated first).
fn run_redirect(mut cmd: Command, program: &str, log_path: &Path) -> Result<RunOutcome> {
    let log = create_log(log_path)?;
    let log_err = log
        .try_clone()
        .map_err(|err| LaunchError::filesystem("clone log handle", log_path, err))?;
    cmd.stdout(Stdio::from(log)).stderr(Stdio::from(log_err));

    let mut child = spawn(&mut cmd, program)?;
    let status = child.wait().context("wait for command")?;
    Ok(RunOutcome {
        log_path: Some(log_path.to_path_buf()),
        ..RunOutcome::from_status(status)
    })
}

/// Relay combined output line by line to `echo` and `log_path` as it arrives.
///
/// Reader threads forward lines from each pipe over a channel; only this
/// thread writes, so lines are never torn. Write failures are logged once per
/// destination and the pipes keep draining so the child is never blocked.
fn run_tee<W: Write>(
    mut cmd: Command,
    program: &str,
    log_path: &Path,
    echo: &mut W,
) -> Result<RunOutcome> {
    let mut log = create_log(log_path)?;
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = spawn(&mut cmd, program)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let stderr_tx = tx.clone();
    let stdout_handle = thread::spawn(move || relay_lines(stdout, tx));
    let stderr_handle = thread::spawn(move || relay_lines(stderr, stderr_tx));

    let mut echo_ok = true;
    let mut log_ok = true;
    for line in rx {
        if echo_ok && let Err(e) = echo.write_all(&line).and_then(|()| echo.flush()) {
            warn!(err = %e, "failed to echo child output");
            echo_ok = false;
        }
        if log_ok && let Err(e) = log.write_all(&line).and_then(|()| log.flush()) {
            warn!(err = %e, path = %log_path.display(), "failed to write log file");
            log_ok = false;
        }
    }

    let status = child.wait().context("wait for command")?;
    join_reader(stdout_handle).context("join stdout")?;
    join_reader(stderr_handle).context("join stderr")?;

    Ok(RunOutcome {
        log_path: Some(log_path.to_path_buf()),
        ..RunOutcome::from_status(status)
    })
}

fn create_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| LaunchError::filesystem("create log dir", parent, err))?;
    }
    File::create(path)
        .map_err(|err| LaunchError::filesystem("create log file", path, err).into())
}

fn relay_lines<R: Read>(reader: R, tx: mpsc::Sender<Vec<u8>>) -> Result<()> {
    let mut reader = BufReader::new(reader);
    loop {
        let mut line = Vec::new();
        let n = reader.read_until(b'\n', &mut line).context("read line")?;
        if n == 0 || tx.send(line).is_err() {
            break;
        }
    }
    Ok(())
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}

fn join_reader<T>(handle: thread::JoinHandle<Result<T>>) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new(["sh", "-c", script]).expect("spec")
    }

    fn sh_command(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn buffered_captures_both_streams() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outcome = ProcessRunner
            .run(
                sh("echo out; echo err >&2"),
                temp.path(),
                &OutputSink::Buffered,
            )
            .expect("run");

        assert!(outcome.success());
        assert_eq!(outcome.stdout.as_deref(), Some("out\n"));
        assert_eq!(outcome.stderr.as_deref(), Some("err\n"));
        assert_eq!(outcome.log_path, None);
    }

    #[test]
    fn buffered_drains_large_output_without_deadlock() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outcome = ProcessRunner
            .run(
                sh("i=0; while [ $i -lt 20000 ]; do echo line-$i; echo err-$i >&2; i=$((i+1)); done"),
                temp.path(),
                &OutputSink::Buffered,
            )
            .expect("run");

        assert!(outcome.success());
        assert_eq!(outcome.stdout.as_deref().map(|s| s.lines().count()), Some(20000));
        assert_eq!(outcome.stderr.as_deref().map(|s| s.lines().count()), Some(20000));
    }

    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outcome = ProcessRunner
            .run(sh("echo boom >&2; exit 3"), temp.path(), &OutputSink::Buffered)
            .expect("run");

        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.status_label(), "exit code 3");
        assert_eq!(outcome.stderr.as_deref(), Some("boom\n"));
    }

    #[test]
    fn runs_in_given_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("here.txt"), "present").expect("write");
        let outcome = ProcessRunner
            .run(sh("cat here.txt"), temp.path(), &OutputSink::Buffered)
            .expect("run");
        assert_eq!(outcome.stdout.as_deref(), Some("present"));
    }

    #[test]
    fn redirect_writes_combined_output_to_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("logs").join("run.log");
        let outcome = ProcessRunner
            .run(
                sh("echo first; echo second >&2"),
                temp.path(),
                &OutputSink::Redirect(log_path.clone()),
            )
            .expect("run");

        assert!(outcome.success());
        assert_eq!(outcome.log_path.as_deref(), Some(log_path.as_path()));
        assert_eq!(outcome.stdout, None);
        let log = fs::read_to_string(&log_path).expect("read log");
        assert!(log.contains("first\n"));
        assert!(log.contains("second\n"));
    }

    #[test]
    fn redirect_truncates_previous_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("run.log");
        fs::write(&log_path, "stale contents\n").expect("write stale log");

        ProcessRunner
            .run(sh("echo fresh"), temp.path(), &OutputSink::Redirect(log_path.clone()))
            .expect("run");

        assert_eq!(fs::read_to_string(&log_path).expect("read log"), "fresh\n");
    }

    #[test]
    fn tee_echoes_and_logs_every_line() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("run.log");
        let mut echo = Vec::new();

        let outcome = run_tee(
            sh_command("echo one; echo two >&2; printf three"),
            "sh",
            &log_path,
            &mut echo,
        )
        .expect("run");

        assert!(outcome.success());
        let echoed = String::from_utf8(echo).expect("utf8");
        let logged = fs::read_to_string(&log_path).expect("read log");
        assert_eq!(echoed, logged);
        for line in ["one\n", "two\n", "three"] {
            assert!(logged.contains(line), "missing {line:?} in {logged:?}");
        }
    }

    #[test]
    fn tee_reports_failure_exit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("run.log");
        let mut echo = Vec::new();

        let outcome =
            run_tee(sh_command("echo partial; exit 7"), "sh", &log_path, &mut echo).expect("run");

        assert_eq!(outcome.exit_code, Some(7));
        assert_eq!(fs::read_to_string(&log_path).expect("read log"), "partial\n");
    }

    #[test]
    fn spawn_failure_is_filesystem_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let spec = CommandSpec::new(["definitely-not-a-real-program-xyz"]).expect("spec");
        let err = ProcessRunner
            .run(spec, temp.path(), &OutputSink::Buffered)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::Filesystem { action: "spawn", .. })
        ));
    }
}
