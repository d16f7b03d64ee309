//! Aggregator: fold every timing report under an output root into one
//! JSON document.
//!
//! Reports are discovered with the two-level pattern
//! `<root>/<benchmark>/<run-method>.json`. Zero-length reports mean "the
//! timing tool produced nothing" and are skipped. A non-empty report that
//! does not parse aborts the whole pass, and nothing is written.

use bmx_common::errors::ErrorCode;
use bmx_common::layout::{LayoutError, REPORT_EXTENSION, key_for};
use bmx_common::AggregateRecord;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid report search pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to walk report tree: {0}")]
    Walk(#[from] glob::GlobError),

    #[error("report root is not valid UTF-8: {}", .0.display())]
    NonUtf8Root(PathBuf),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to read report {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt report {}: {source}", path.display())]
    CorruptReport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write aggregate {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AggregateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Pattern { .. } | Self::NonUtf8Root(_) | Self::Walk(_) | Self::Read { .. } => {
                ErrorCode::ReportWalkError
            }
            Self::Layout(_) | Self::CorruptReport { .. } => ErrorCode::ReportCorrupt,
            Self::Write { .. } => ErrorCode::ReportWriteFailed,
        }
    }
}

/// Counts from one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub destination: PathBuf,
    pub reports_found: usize,
    pub records: usize,
    pub skipped_empty: usize,
}

/// Every file matching `<root>/*/*.json`, in sorted path order.
///
/// Dot-prefixed names never match a wildcard, so `._m1.json` side-cars
/// and hidden directories are not reports.
pub fn report_paths(root: &Path) -> Result<Vec<PathBuf>, AggregateError> {
    let root_str = root
        .to_str()
        .ok_or_else(|| AggregateError::NonUtf8Root(root.to_path_buf()))?;
    let pattern = format!(
        "{}/*/*.{REPORT_EXTENSION}",
        glob::Pattern::escape(root_str.trim_end_matches('/'))
    );

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|source| AggregateError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Parse every non-empty report under `root` into records.
///
/// Returns the records plus the number of empty reports skipped.
pub fn collect_records(root: &Path) -> Result<(Vec<AggregateRecord>, usize), AggregateError> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for path in report_paths(root)? {
        let contents = fs::read(&path).map_err(|source| AggregateError::Read {
            path: path.clone(),
            source,
        })?;
        if contents.is_empty() {
            debug!(report = %path.display(), "Skipping empty report");
            skipped += 1;
            continue;
        }

        let key = key_for(&path)?;
        let payload = serde_json::from_slice(&contents).map_err(|source| {
            AggregateError::CorruptReport {
                path: path.clone(),
                source,
            }
        })?;
        records.push(AggregateRecord::new(key, payload));
    }

    Ok((records, skipped))
}

/// Write `records` as a pretty-printed JSON array to `destination`.
///
/// The document is written to a temporary file next to the destination and
/// renamed into place, so readers never observe a partial document.
pub fn write_aggregate(records: &[AggregateRecord], destination: &Path) -> Result<(), AggregateError> {
    let write_err = |source| AggregateError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    serde_json::to_writer_pretty(&mut tmp, records).map_err(|e| write_err(e.into()))?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(destination).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Collect every report under `root` and write the aggregate to
/// `destination`.
pub fn aggregate(root: &Path, destination: &Path) -> Result<AggregateSummary, AggregateError> {
    let (records, skipped_empty) = collect_records(root)?;
    write_aggregate(&records, destination)?;

    let summary = AggregateSummary {
        destination: destination.to_path_buf(),
        reports_found: records.len() + skipped_empty,
        records: records.len(),
        skipped_empty,
    };
    info!(
        root = %root.display(),
        destination = %destination.display(),
        records = summary.records,
        skipped_empty = summary.skipped_empty,
        "Aggregate written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_report_paths_ignore_other_artifacts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "fib/m1.json", "{}");
        write(tmp.path(), "fib/m1", "#!/bin/sh");
        write(tmp.path(), "fib/m1-args", "10");
        write(tmp.path(), "top.json", "{}");
        write(tmp.path(), "fib/deeper/m2.json", "{}");

        let paths = report_paths(tmp.path()).unwrap();
        assert_eq!(paths, vec![tmp.path().join("fib/m1.json")]);
    }

    #[test]
    fn test_dot_prefixed_reports_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "fib/m1.json", "{\"x\":1}");
        let resource_fork = tmp.path().join("fib/._m1.json");
        fs::write(&resource_fork, [0x00, 0x05, 0x16, 0x07, 0xff]).unwrap();
        write(tmp.path(), "fib/.x.json", "{\"y\":2}");
        write(tmp.path(), ".hidden/m1.json", "{\"z\":3}");

        let paths = report_paths(tmp.path()).unwrap();
        assert_eq!(paths, vec![tmp.path().join("fib/m1.json")]);

        let (records, skipped) = collect_records(tmp.path()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].run_method, "m1");
    }

    #[test]
    fn test_report_paths_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(report_paths(&tmp.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_root_with_glob_metacharacters() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("run[1]");
        write(&root, "fib/m1.json", "{\"x\":1}");
        let (records, _) = collect_records(&root).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_collect_skips_empty_and_tags_records() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/bar.json", "{\"results\":[]}");
        write(tmp.path(), "foo/empty.json", "");

        let (records, skipped) = collect_records(tmp.path()).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].benchmark, "foo");
        assert_eq!(records[0].run_method, "bar");
    }

    #[test]
    fn test_corrupt_report_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/bad.json", "not json");
        let err = collect_records(tmp.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReportCorrupt);
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_write_aggregate_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("nightly/data/profile.json");
        write_aggregate(&[], &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "[]");
    }
}
