//! Timing tool invocation (hyperfine-compatible command line).

use bmx_common::config::TimingConfig;
use bmx_common::util::shell_quote;
use std::path::Path;

use crate::process::{self, OutputMode, ProcessError, ProcessOutput, ProcessSpec};

#[derive(Debug, Clone)]
pub struct TimingTool {
    program: String,
    prefix_args: Vec<String>,
    warmup: u32,
    max_runs: Option<u32>,
}

impl TimingTool {
    pub fn new(program: impl Into<String>, warmup: u32) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            warmup,
            max_runs: None,
        }
    }

    pub fn from_config(config: &TimingConfig) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.args.clone(),
            warmup: config.warmup,
            max_runs: config.max_runs,
        }
    }

    #[must_use]
    pub fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    #[must_use]
    pub fn with_max_runs(mut self, max_runs: Option<u32>) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// `--warmup N [--max-runs M] [--export-json <file>] "<command>"`
    pub fn invocation(&self, command: &str, export: Option<&Path>) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.program)
            .args(&self.prefix_args)
            .arg("--warmup")
            .arg(self.warmup.to_string());
        if let Some(max_runs) = self.max_runs {
            spec = spec.arg("--max-runs").arg(max_runs.to_string());
        }
        if let Some(export) = export {
            spec = spec.arg("--export-json").arg(export);
        }
        spec.arg(command).output_mode(OutputMode::Passthrough)
    }

    pub fn measure(
        &self,
        command: &str,
        export: Option<&Path>,
    ) -> Result<ProcessOutput, ProcessError> {
        process::run(&self.invocation(command, export))
    }
}

/// The shell command the timing tool runs: the executable followed by the
/// literal contents of its args side-car.
pub fn benchmark_command(executable: &Path, runtime_args: &str) -> String {
    let exe = shell_quote(&executable.to_string_lossy()).into_owned();
    if runtime_args.trim().is_empty() {
        exe
    } else {
        format!("{exe} {runtime_args}")
    }
}
