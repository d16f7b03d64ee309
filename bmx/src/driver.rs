//! Matrix driver: discover the corpus, sweep every program, aggregate once.
//!
//! The first failing program stops the run and no aggregate is written.
//! Programs are never swept in parallel.

use bmx_common::errors::ErrorCode;
use bmx_common::{HarnessConfig, ModeSet};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::aggregate::{self, AggregateError, AggregateSummary};
use crate::compiler::Compiler;
use crate::discovery::{self, DiscoveryError, Program};
use crate::sweep::{SweepError, SweepRunner, SweepSummary};
use crate::timing::TimingTool;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("sweep of {} failed: {source}", program.display())]
    Sweep {
        program: PathBuf,
        #[source]
        source: SweepError,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl DriverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Discovery(err) => err.code(),
            Self::Sweep { source, .. } => source.code(),
            Self::Aggregate(err) => err.code(),
        }
    }
}

/// Everything one `bmx run` produced.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub sweeps: Vec<SweepSummary>,
    pub aggregate: AggregateSummary,
}

/// Owns the collaborators and mode set for a full matrix run.
#[derive(Debug)]
pub struct MatrixDriver {
    compiler: Compiler,
    timing: TimingTool,
    modes: ModeSet,
    corpus_roots: Vec<PathBuf>,
    extension: String,
    output_root: PathBuf,
    aggregate_path: PathBuf,
}

impl MatrixDriver {
    pub fn new(config: &HarnessConfig, modes: ModeSet) -> Self {
        Self {
            compiler: Compiler::from_config(&config.compiler),
            timing: TimingTool::from_config(&config.timing),
            modes,
            corpus_roots: config.corpus.roots.clone(),
            extension: config.corpus.extension.clone(),
            output_root: config.output.root.clone(),
            aggregate_path: config.output.aggregate.clone(),
        }
    }

    pub fn discover(&self) -> Result<Vec<Program>, DriverError> {
        Ok(discovery::discover_programs(
            &self.corpus_roots,
            &self.extension,
        )?)
    }

    /// Sweep one program without aggregating.
    pub fn sweep(&self, program: &Program) -> Result<SweepSummary, DriverError> {
        self.runner()
            .run(&program.path)
            .map_err(|source| DriverError::Sweep {
                program: program.path.clone(),
                source,
            })
    }

    /// Discover, sweep every program in order, then aggregate.
    pub fn run(&self) -> Result<MatrixReport, DriverError> {
        let programs = self.discover()?;
        self.run_programs(&programs)
    }

    /// Sweep the given programs in order, then aggregate.
    pub fn run_programs(&self, programs: &[Program]) -> Result<MatrixReport, DriverError> {
        discovery::ensure_unique_ids(programs)?;
        info!(
            programs = programs.len(),
            modes = self.modes.len(),
            output_root = %self.output_root.display(),
            "Starting matrix run"
        );

        let runner = self.runner();
        let mut sweeps = Vec::with_capacity(programs.len());
        for (index, program) in programs.iter().enumerate() {
            info!(
                benchmark = %program.id,
                progress = %format!("{}/{}", index + 1, programs.len()),
                "Program"
            );
            let summary = runner.run(&program.path).map_err(|source| {
                error!(benchmark = %program.id, error = %source, code = %source.code(), "Sweep failed");
                DriverError::Sweep {
                    program: program.path.clone(),
                    source,
                }
            })?;
            sweeps.push(summary);
        }

        let aggregate = aggregate::aggregate(&self.output_root, &self.aggregate_path)?;
        Ok(MatrixReport { sweeps, aggregate })
    }

    fn runner(&self) -> SweepRunner<'_> {
        SweepRunner::new(
            &self.compiler,
            &self.timing,
            &self.modes,
            self.output_root.clone(),
        )
    }
}
