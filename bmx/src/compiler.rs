//! Compiler invocation.
//!
//! The compiler is an external collaborator. Given a source file, a run
//! method, optimization flags and an output prefix `<out>`, it writes the
//! executable to `<out>` and the runtime arguments to `<out>-args`.

use bmx_common::Mode;
use bmx_common::config::CompilerConfig;
use std::path::Path;

use crate::process::{self, OutputMode, ProcessError, ProcessOutput, ProcessSpec};

#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    prefix_args: Vec<String>,
}

impl Compiler {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// `<prefix...> <source> --run-mode <rm> [--<flag> <bool>]... -o <output>`
    pub fn invocation(&self, source: &Path, mode: &Mode, output: &Path) -> ProcessSpec {
        ProcessSpec::new(&self.program)
            .args(&self.prefix_args)
            .arg(source)
            .args(["--run-mode", mode.run_method()])
            .args(mode.render_options())
            .arg("-o")
            .arg(output)
            .output_mode(OutputMode::Capture)
    }

    pub fn compile(
        &self,
        source: &Path,
        mode: &Mode,
        output: &Path,
    ) -> Result<ProcessOutput, ProcessError> {
        process::run(&self.invocation(source, mode, output))
    }
}
