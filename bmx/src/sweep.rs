//! Sweep runner: one program through every mode.
//!
//! For each mode, in order, the runner compiles the program, reads the
//! runtime arguments side-car, and times the executable into
//! `<root>/<program>/<mode>.json`. Steps never overlap; timing results are
//! only meaningful with exclusive use of the machine.
//!
//! Failure policy per step:
//! - **compile**: fatal for the program ([`SweepError::CompileFailed`])
//! - **args side-car**: fatal ([`SweepError::ArgsUnreadable`])
//! - **timing**: recoverable; the report is left empty and the aggregator
//!   skips it

use bmx_common::errors::ErrorCode;
use bmx_common::layout::{self, ArtifactPaths, LayoutError, ProgramId};
use bmx_common::util::normalize_runtime_args;
use bmx_common::{Mode, ModeSet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::compiler::Compiler;
use crate::process::ProcessError;
use crate::timing::{TimingTool, benchmark_command};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("output directory {} already exists; clear it before re-running", .0.display())]
    ProgramDirExists(PathBuf),

    #[error("failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("compiling {} in mode {mode} failed: {source}", program.display())]
    CompileFailed {
        program: PathBuf,
        mode: String,
        #[source]
        source: ProcessError,
    },

    #[error("cannot read runtime arguments {}: {source}", path.display())]
    ArgsUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compiler {program} could not be started: {source}")]
    CompilerUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("timing tool {program} could not be started: {source}")]
    TimingToolUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to reset report {}: {source}", path.display())]
    ReportReset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SweepError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ProgramDirExists(_) => ErrorCode::BuildOutputExists,
            Self::CreateDir { .. } => ErrorCode::BuildOutputCreateFailed,
            Self::Layout(_) => ErrorCode::CorpusInvalidProgram,
            Self::CompileFailed { .. } => ErrorCode::BuildCompileFailed,
            Self::ArgsUnreadable { .. } => ErrorCode::BuildArgsMissing,
            Self::CompilerUnavailable { .. } => ErrorCode::BuildCompilerUnavailable,
            Self::TimingToolUnavailable { .. } => ErrorCode::TimingToolUnavailable,
            Self::ReportReset { .. } => ErrorCode::TimingReportResetFailed,
        }
    }

    /// Exit code of the failed compile, if that is what went wrong.
    pub fn compile_exit_code(&self) -> Option<i32> {
        match self {
            Self::CompileFailed { source, .. } => source.exit_code(),
            _ => None,
        }
    }
}

/// What happened to one (program, mode) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ModeOutcome {
    pub mode: String,
    pub run_method: String,
    /// Report written by the timing tool; `None` when timing failed and the
    /// report was left empty.
    pub report: Option<PathBuf>,
    pub compile_ms: u64,
    pub timing_ms: u64,
}

/// Result of sweeping one program.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub benchmark: ProgramId,
    pub program: PathBuf,
    pub program_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub modes: Vec<ModeOutcome>,
}

impl SweepSummary {
    pub fn reports_written(&self) -> usize {
        self.modes.iter().filter(|m| m.report.is_some()).count()
    }

    pub fn timing_failures(&self) -> impl Iterator<Item = &ModeOutcome> {
        self.modes.iter().filter(|m| m.report.is_none())
    }
}

/// Drives one program through a [`ModeSet`].
#[derive(Debug)]
pub struct SweepRunner<'a> {
    compiler: &'a Compiler,
    timing: &'a TimingTool,
    modes: &'a ModeSet,
    root: PathBuf,
}

impl<'a> SweepRunner<'a> {
    pub fn new(
        compiler: &'a Compiler,
        timing: &'a TimingTool,
        modes: &'a ModeSet,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            timing,
            modes,
            root: root.into(),
        }
    }

    /// Sweep `program` through every mode.
    ///
    /// Creates `<root>/<program-id>/` and fails if it already exists.
    pub fn run(&self, program: &Path) -> Result<SweepSummary, SweepError> {
        let benchmark = ProgramId::from_path(program)?;
        let program_dir = layout::program_dir(&self.root, &benchmark);
        create_program_dir(&self.root, &program_dir)?;

        info!(
            benchmark = %benchmark,
            program = %program.display(),
            modes = self.modes.len(),
            "Sweeping program"
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(self.modes.len());

        for mode in self.modes {
            let paths = ArtifactPaths::new(&program_dir, mode.name());
            let outcome = self.run_mode(program, mode, &paths)?;
            outcomes.push(outcome);
        }

        let summary = SweepSummary {
            benchmark,
            program: program.to_path_buf(),
            program_dir,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            modes: outcomes,
        };

        info!(
            benchmark = %summary.benchmark,
            reports = summary.reports_written(),
            timing_failures = summary.timing_failures().count(),
            duration_ms = summary.duration_ms,
            "Program sweep complete"
        );

        Ok(summary)
    }

    fn run_mode(
        &self,
        program: &Path,
        mode: &Mode,
        paths: &ArtifactPaths,
    ) -> Result<ModeOutcome, SweepError> {
        info!(mode = mode.name(), run_method = mode.run_method(), "Compiling");
        let (runtime_args, compile_ms) =
            compile_and_read_args(self.compiler, program, mode, paths)?;

        let command = benchmark_command(&paths.executable, &runtime_args);
        let (report, timing_ms) = match self.timing.measure(&command, Some(&paths.report)) {
            Ok(output) => (
                Some(paths.report.clone()),
                output.elapsed.as_millis() as u64,
            ),
            Err(ProcessError::Spawn { program, source }) => {
                return Err(SweepError::TimingToolUnavailable { program, source });
            }
            Err(err) => {
                warn!(
                    mode = mode.name(),
                    report = %paths.report.display(),
                    error = %err,
                    "Timing failed; leaving report empty"
                );
                reset_report(&paths.report)?;
                let elapsed = match &err {
                    ProcessError::Failed { elapsed, .. } => elapsed.as_millis() as u64,
                    ProcessError::Spawn { .. } => 0,
                };
                (None, elapsed)
            }
        };

        Ok(ModeOutcome {
            mode: mode.name().to_string(),
            run_method: mode.run_method().to_string(),
            report,
            compile_ms,
            timing_ms,
        })
    }
}

/// Compile `program` in `mode` and return its runtime arguments with the
/// compile duration in milliseconds.
pub(crate) fn compile_and_read_args(
    compiler: &Compiler,
    program: &Path,
    mode: &Mode,
    paths: &ArtifactPaths,
) -> Result<(String, u64), SweepError> {
    let output = compiler
        .compile(program, mode, &paths.executable)
        .map_err(|err| match err {
            ProcessError::Spawn { program, source } => {
                SweepError::CompilerUnavailable { program, source }
            }
            failed @ ProcessError::Failed { .. } => SweepError::CompileFailed {
                program: program.to_path_buf(),
                mode: mode.name().to_string(),
                source: failed,
            },
        })?;

    let raw = fs::read_to_string(&paths.args).map_err(|source| SweepError::ArgsUnreadable {
        path: paths.args.clone(),
        source,
    })?;

    Ok((
        normalize_runtime_args(&raw).to_string(),
        output.elapsed.as_millis() as u64,
    ))
}

fn create_program_dir(root: &Path, program_dir: &Path) -> Result<(), SweepError> {
    fs::create_dir_all(root).map_err(|source| SweepError::CreateDir {
        path: root.to_path_buf(),
        source,
    })?;
    match fs::create_dir(program_dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            Err(SweepError::ProgramDirExists(program_dir.to_path_buf()))
        }
        Err(source) => Err(SweepError::CreateDir {
            path: program_dir.to_path_buf(),
            source,
        }),
    }
}

/// Leave a zero-length report: the aggregator's signal for "no data".
fn reset_report(report: &Path) -> Result<(), SweepError> {
    fs::File::create(report)
        .map(drop)
        .map_err(|source| SweepError::ReportReset {
            path: report.to_path_buf(),
            source,
        })
}
