//! Four-way sweep of a single program.
//!
//! Compiles one program with egglog and LLVM optimization toggled
//! independently and lets the timing tool print its report to the terminal.
//! Nothing is exported. Artifacts live under a scratch directory and are
//! removed after each mode unless the caller asks to keep them.

use bmx_common::layout::{self, ArtifactPaths, ProgramId};
use bmx_common::{Mode, ModeSet};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::compiler::Compiler;
use crate::process::ProcessError;
use crate::sweep::{SweepError, compile_and_read_args};
use crate::timing::{TimingTool, benchmark_command};

pub const FOUR_WAY_WARMUP: u32 = 3;
pub const FOUR_WAY_MAX_RUNS: u32 = 100;

/// Result of one mode in a four-way sweep.
#[derive(Debug, Clone, Serialize)]
pub struct FourWayOutcome {
    pub mode: String,
    pub timed: bool,
    pub compile_ms: u64,
    pub timing_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FourWaySummary {
    pub benchmark: ProgramId,
    pub scratch_dir: PathBuf,
    pub kept_artifacts: bool,
    pub modes: Vec<FourWayOutcome>,
}

#[derive(Debug)]
pub struct FourWaySweep<'a> {
    compiler: &'a Compiler,
    timing: TimingTool,
    modes: ModeSet,
    scratch: PathBuf,
    keep: bool,
}

impl<'a> FourWaySweep<'a> {
    /// Builds the sweep with the fixed grid and timing budget. `timing` keeps
    /// its program and prefix arguments; warm-up and run limit are replaced.
    pub fn new(compiler: &'a Compiler, timing: &TimingTool, scratch: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            timing: timing
                .clone()
                .with_warmup(FOUR_WAY_WARMUP)
                .with_max_runs(Some(FOUR_WAY_MAX_RUNS)),
            modes: ModeSet::four_way(),
            scratch: scratch.into(),
            keep: false,
        }
    }

    #[must_use]
    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    pub fn run(&self, program: &Path) -> Result<FourWaySummary, SweepError> {
        let benchmark = ProgramId::from_path(program)?;
        let scratch_dir = layout::program_dir(&self.scratch, &benchmark);
        fs::create_dir_all(&scratch_dir).map_err(|source| SweepError::CreateDir {
            path: scratch_dir.clone(),
            source,
        })?;

        info!(
            benchmark = %benchmark,
            scratch = %scratch_dir.display(),
            keep = self.keep,
            "Starting four-way sweep"
        );

        let mut outcomes = Vec::with_capacity(self.modes.len());
        for mode in &self.modes {
            let paths = ArtifactPaths::new(&scratch_dir, mode.name());
            let outcome = self.run_mode(program, mode, &paths);
            if !self.keep {
                remove_artifacts(&paths);
            }
            outcomes.push(outcome?);
        }

        Ok(FourWaySummary {
            benchmark,
            scratch_dir,
            kept_artifacts: self.keep,
            modes: outcomes,
        })
    }

    fn run_mode(
        &self,
        program: &Path,
        mode: &Mode,
        paths: &ArtifactPaths,
    ) -> Result<FourWayOutcome, SweepError> {
        info!(mode = mode.name(), run_method = mode.run_method(), "Compiling");
        let (runtime_args, compile_ms) =
            compile_and_read_args(self.compiler, program, mode, paths)?;

        let command = benchmark_command(&paths.executable, &runtime_args);
        let (timed, timing_ms) = match self.timing.measure(&command, None) {
            Ok(output) => (true, output.elapsed.as_millis() as u64),
            Err(ProcessError::Spawn { program, source }) => {
                return Err(SweepError::TimingToolUnavailable { program, source });
            }
            Err(err) => {
                warn!(mode = mode.name(), error = %err, "Timing failed; skipping mode");
                let elapsed = match &err {
                    ProcessError::Failed { elapsed, .. } => elapsed.as_millis() as u64,
                    ProcessError::Spawn { .. } => 0,
                };
                (false, elapsed)
            }
        };

        Ok(FourWayOutcome {
            mode: mode.name().to_string(),
            timed,
            compile_ms,
            timing_ms,
        })
    }
}

/// Best-effort removal of the executable and args side-car.
fn remove_artifacts(paths: &ArtifactPaths) {
    for path in [&paths.executable, &paths.args] {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed artifact"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmx_common::errors::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_fixed_budget_overrides_configured_timing() {
        let compiler = Compiler::new("cc", Vec::new());
        let timing = TimingTool::new("hyperfine", 2);
        let sweep = FourWaySweep::new(&compiler, &timing, "tmp/bench-one");
        let spec = sweep.timing.invocation("./tmp", None);
        assert_eq!(spec.display(), "hyperfine --warmup 3 --max-runs 100 ./tmp");
        assert_eq!(sweep.modes().len(), 4);
    }

    #[test]
    fn test_remove_artifacts_tolerates_missing_files() {
        let tmp = TempDir::new().unwrap();
        let paths = ArtifactPaths::new(tmp.path(), "egglog_opt_llvm_opt");
        fs::write(&paths.executable, "").unwrap();
        remove_artifacts(&paths);
        assert!(!paths.executable.exists());
        assert!(!paths.args.exists());
    }

    #[test]
    fn test_missing_compiler_reported_and_scratch_reused() {
        let tmp = TempDir::new().unwrap();
        let compiler = Compiler::new("bmx-no-such-compiler", Vec::new());
        let timing = TimingTool::new("hyperfine", 2);
        let sweep = FourWaySweep::new(&compiler, &timing, tmp.path());

        let program = tmp.path().join("fib.bril");
        fs::write(&program, "").unwrap();
        fs::create_dir(tmp.path().join("fib")).unwrap();

        let err = sweep.run(&program).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BuildCompilerUnavailable);
    }
}
