//! On-disk layout of sweep output.
//!
//! The output root is a two-level tree:
//!
//! ```text
//! <root>/
//!   <benchmark>/
//!     <mode>          executable produced by the compiler
//!     <mode>-args     runtime arguments side-car
//!     <mode>.json     timing report
//! ```
//!
//! The directory name and file name are the only record of which benchmark
//! and run method a report belongs to, so encoding and decoding both live
//! here: [`path_for`] and its inverse [`key_for`].

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of the runtime-arguments side-car written by the compiler.
pub const ARGS_SUFFIX: &str = "-args";

/// Extension of timing reports.
pub const REPORT_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("cannot derive a program identifier from {0}")]
    InvalidProgramPath(PathBuf),

    #[error("{0} is not a report file (expected <root>/<benchmark>/<run-method>.json)")]
    NotAReport(PathBuf),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),
}

/// Identifier of a corpus program: its file name without the extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    pub fn from_path(path: &Path) -> Result<Self, LayoutError> {
        let stem = path
            .file_stem()
            .ok_or_else(|| LayoutError::InvalidProgramPath(path.to_path_buf()))?;
        let stem = stem
            .to_str()
            .ok_or_else(|| LayoutError::NonUtf8(path.to_path_buf()))?;
        if stem.is_empty() {
            return Err(LayoutError::InvalidProgramPath(path.to_path_buf()));
        }
        Ok(Self(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one timing report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunKey {
    pub benchmark: String,
    pub run_method: String,
}

impl RunKey {
    pub fn new(benchmark: impl Into<String>, run_method: impl Into<String>) -> Self {
        Self {
            benchmark: benchmark.into(),
            run_method: run_method.into(),
        }
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.benchmark, self.run_method)
    }
}

/// Report path for `key` under `root`.
pub fn path_for(root: &Path, key: &RunKey) -> PathBuf {
    root.join(&key.benchmark)
        .join(format!("{}.{REPORT_EXTENSION}", key.run_method))
}

/// Decode a report path back into its [`RunKey`].
///
/// The benchmark comes from the immediate parent directory and the run method
/// from the file name with its `.json` extension stripped.
pub fn key_for(path: &Path) -> Result<RunKey, LayoutError> {
    let not_a_report = || LayoutError::NotAReport(path.to_path_buf());

    if path.extension().and_then(|ext| ext.to_str()) != Some(REPORT_EXTENSION) {
        return Err(not_a_report());
    }

    let run_method = path.file_stem().ok_or_else(not_a_report)?;
    let benchmark = path
        .parent()
        .and_then(Path::file_name)
        .ok_or_else(not_a_report)?;

    let run_method = run_method
        .to_str()
        .ok_or_else(|| LayoutError::NonUtf8(path.to_path_buf()))?;
    let benchmark = benchmark
        .to_str()
        .ok_or_else(|| LayoutError::NonUtf8(path.to_path_buf()))?;

    if run_method.is_empty() {
        return Err(not_a_report());
    }

    Ok(RunKey::new(benchmark, run_method))
}

/// Directory holding every artifact for one program.
pub fn program_dir(root: &Path, program: &ProgramId) -> PathBuf {
    root.join(program.as_str())
}

/// Paths of the artifacts produced for one (program, mode) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub executable: PathBuf,
    pub args: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn new(program_dir: &Path, mode_name: &str) -> Self {
        let executable = program_dir.join(mode_name);
        let args = with_suffix(&executable, ARGS_SUFFIX);
        let report = program_dir.join(format!("{mode_name}.{REPORT_EXTENSION}"));
        Self {
            executable,
            args,
            report,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_for_naming_derivation() {
        let key = key_for(Path::new("root/foo/bar.json")).unwrap();
        assert_eq!(key.benchmark, "foo");
        assert_eq!(key.run_method, "bar");
    }

    #[test]
    fn test_path_for_layout() {
        let key = RunKey::new("fib", "egglog_opt_brilift_opt");
        assert_eq!(
            path_for(Path::new("/tmp/bench"), &key),
            PathBuf::from("/tmp/bench/fib/egglog_opt_brilift_opt.json")
        );
    }

    #[test]
    fn test_key_for_keeps_inner_dots() {
        let key = key_for(Path::new("r/bench/v1.2.json")).unwrap();
        assert_eq!(key.run_method, "v1.2");
    }

    #[test]
    fn test_key_for_rejects_non_reports() {
        assert!(key_for(Path::new("root/foo/bar")).is_err());
        assert!(key_for(Path::new("root/foo/bar-args")).is_err());
        assert!(key_for(Path::new("root/foo/bar.txt")).is_err());
        assert!(key_for(Path::new("bar.json")).is_err());
    }

    #[test]
    fn test_program_id_strips_extension() {
        let id = ProgramId::from_path(Path::new("benchmarks/passing/raytrace.bril")).unwrap();
        assert_eq!(id.as_str(), "raytrace");
        assert!(ProgramId::from_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_artifact_paths_share_prefix() {
        let paths = ArtifactPaths::new(Path::new("tmp/bench/fib"), "m1");
        assert_eq!(paths.executable, PathBuf::from("tmp/bench/fib/m1"));
        assert_eq!(paths.args, PathBuf::from("tmp/bench/fib/m1-args"));
        assert_eq!(paths.report, PathBuf::from("tmp/bench/fib/m1.json"));
        assert_eq!(
            key_for(&paths.report).unwrap(),
            RunKey::new("fib", "m1")
        );
    }

    proptest! {
        #[test]
        fn prop_key_for_inverts_path_for(
            benchmark in "[a-z][a-z0-9_-]{0,15}",
            run_method in "[a-z][a-z0-9_.]{0,15}",
        ) {
            let key = RunKey::new(benchmark, run_method);
            let path = path_for(Path::new("/out"), &key);
            prop_assert_eq!(key_for(&path).unwrap(), key);
        }
    }
}
