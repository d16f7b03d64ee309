//! Coverage comparison between two aggregate documents.
//!
//! Only the set of `(benchmark, runMethod)` keys is compared; timing
//! payloads are not inspected.

use bmx_common::errors::ErrorCode;
use bmx_common::{AggregateRecord, RunKey};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to read aggregate {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("aggregate {} is not a valid record array: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CompareError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ReportLoadFailed
    }
}

pub fn load_aggregate(path: &Path) -> Result<Vec<AggregateRecord>, CompareError> {
    let contents = fs::read(path).map_err(|source| CompareError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&contents).map_err(|source| CompareError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Keys present on one side only. Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDiff {
    /// Benchmarks in the baseline that the current run lacks entirely.
    pub missing_benchmarks: Vec<String>,
    /// Benchmarks only the current run has.
    pub new_benchmarks: Vec<String>,
    pub missing_runs: Vec<RunKey>,
    pub new_runs: Vec<RunKey>,
}

impl CoverageDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_benchmarks.is_empty()
            && self.new_benchmarks.is_empty()
            && self.missing_runs.is_empty()
            && self.new_runs.is_empty()
    }

    /// Human-readable warnings, one per line item.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for benchmark in &self.missing_benchmarks {
            out.push(format!(
                "Baseline run had benchmark {benchmark} that the current run doesn't"
            ));
        }
        for benchmark in &self.new_benchmarks {
            out.push(format!(
                "Current run has benchmark {benchmark} that the baseline doesn't"
            ));
        }
        for key in &self.missing_runs {
            out.push(format!(
                "Baseline run had {} for {} that the current run doesn't",
                key.run_method, key.benchmark
            ));
        }
        for key in &self.new_runs {
            out.push(format!(
                "Current run has {} for {} that the baseline doesn't",
                key.run_method, key.benchmark
            ));
        }
        out
    }

    pub fn render_text(&self) -> String {
        if self.is_empty() {
            return "Coverage matches baseline\n".to_string();
        }
        let mut out = String::new();
        for line in self.warnings() {
            let _ = writeln!(out, "warning: {line}");
        }
        out
    }
}

pub fn compare(baseline: &[AggregateRecord], current: &[AggregateRecord]) -> CoverageDiff {
    let base_keys: BTreeSet<RunKey> = baseline.iter().map(AggregateRecord::key).collect();
    let cur_keys: BTreeSet<RunKey> = current.iter().map(AggregateRecord::key).collect();
    let base_benchmarks: BTreeSet<&str> = baseline.iter().map(|r| r.benchmark.as_str()).collect();
    let cur_benchmarks: BTreeSet<&str> = current.iter().map(|r| r.benchmark.as_str()).collect();

    CoverageDiff {
        missing_benchmarks: base_benchmarks
            .difference(&cur_benchmarks)
            .map(|b| b.to_string())
            .collect(),
        new_benchmarks: cur_benchmarks
            .difference(&base_benchmarks)
            .map(|b| b.to_string())
            .collect(),
        missing_runs: base_keys.difference(&cur_keys).cloned().collect(),
        new_runs: cur_keys.difference(&base_keys).cloned().collect(),
    }
}
