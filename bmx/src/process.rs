//! Blocking external invocations with an explicit result.
//!
//! Every call to the compiler or the timing tool goes through [`run`], which
//! returns either the completed [`ProcessOutput`] or a [`ProcessError`]
//! carrying the exit code, captured stderr and elapsed time. Call sites
//! decide which failures are fatal.

use bmx_common::util::render_command_line;
use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// What to do with the child's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Capture both streams.
    Capture,
    /// Let both streams through to the terminal.
    Passthrough,
}

/// A program plus arguments, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    program: OsString,
    args: Vec<OsString>,
    output: OutputMode,
}

impl ProcessSpec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            output: OutputMode::Capture,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    #[must_use]
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-quoted rendering for logs and error messages.
    pub fn display(&self) -> String {
        render_command_line(&self.program, &self.args)
    }
}

/// A process that ran and exited successfully.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {}", describe_exit(.exit_code))]
    Failed {
        command: String,
        /// `None` when the process was killed by a signal.
        exit_code: Option<i32>,
        stderr: String,
        elapsed: Duration,
    },
}

impl ProcessError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::Failed { exit_code, .. } => *exit_code,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            Self::Spawn { .. } => "",
            Self::Failed { stderr, .. } => stderr,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Run `spec` to completion, blocking the calling thread.
pub fn run(spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
    let command_line = spec.display();
    debug!(command = %command_line, "Running external command");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null());
    if spec.output == OutputMode::Passthrough {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    let start = Instant::now();
    let output = cmd.output().map_err(|source| ProcessError::Spawn {
        program: spec.program.to_string_lossy().into_owned(),
        source,
    })?;
    let elapsed = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    debug!(
        command = %command_line,
        exit_code = ?output.status.code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "External command finished"
    );

    if !output.status.success() {
        return Err(ProcessError::Failed {
            command: command_line,
            exit_code: output.status.code(),
            stderr,
            elapsed,
        });
    }

    Ok(ProcessOutput {
        stdout,
        stderr,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_arguments() {
        let spec = ProcessSpec::new("hyperfine")
            .args(["--warmup", "2"])
            .arg("./bin 1 2");
        assert_eq!(spec.display(), "hyperfine --warmup 2 './bin 1 2'");
        assert_eq!(spec.get_args().len(), 3);
    }

    #[test]
    fn test_spawn_failure_is_tagged() {
        let err = run(&ProcessSpec::new("bmx-definitely-missing-tool")).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_code_and_stderr() {
        let spec = ProcessSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let err = run(&spec).unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.stderr().trim(), "boom");
        assert!(err.to_string().contains("status 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_captures_stdout() {
        let out = run(&ProcessSpec::new("sh").args(["-c", "printf hello"])).unwrap();
        assert_eq!(out.stdout, "hello");
        assert!(out.stderr.is_empty());
    }
}
