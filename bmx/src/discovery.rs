//! Corpus discovery.
//!
//! Programs are found by recursive glob over each corpus root. Every program
//! must have a unique identifier, because the identifier names its output
//! directory; collisions are reported before any compilation starts.

use bmx_common::errors::ErrorCode;
use bmx_common::layout::{LayoutError, ProgramId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid corpus pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to walk corpus: {0}")]
    Walk(#[from] glob::GlobError),

    #[error("corpus root is not valid UTF-8: {}", .0.display())]
    NonUtf8Root(PathBuf),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(
        "programs {} and {} share the identifier '{id}'; output directories would collide",
        first.display(),
        second.display()
    )]
    DuplicateProgramId {
        id: ProgramId,
        first: PathBuf,
        second: PathBuf,
    },
}

impl DiscoveryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Pattern { .. } | Self::NonUtf8Root(_) => ErrorCode::CorpusPatternError,
            Self::Walk(_) => ErrorCode::CorpusWalkError,
            Self::Layout(_) => ErrorCode::CorpusInvalidProgram,
            Self::DuplicateProgramId { .. } => ErrorCode::CorpusDuplicateProgram,
        }
    }
}

/// A corpus program and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub id: ProgramId,
    pub path: PathBuf,
}

impl Program {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, LayoutError> {
        let path = path.into();
        let id = ProgramId::from_path(&path)?;
        Ok(Self { id, path })
    }
}

/// Find every `*.<extension>` file under `roots`, recursively.
///
/// Roots are scanned in order and each root's matches come back sorted.
/// Missing roots contribute nothing. Identifiers are checked for uniqueness.
pub fn discover_programs(roots: &[PathBuf], extension: &str) -> Result<Vec<Program>, DiscoveryError> {
    let mut programs = Vec::new();

    for root in roots {
        let found = glob_root(root, extension)?;
        debug!(root = %root.display(), count = found.len(), "Scanned corpus root");
        for path in found {
            programs.push(Program::from_path(path)?);
        }
    }

    ensure_unique_ids(&programs)?;
    info!(programs = programs.len(), roots = roots.len(), "Corpus discovered");
    Ok(programs)
}

fn glob_root(root: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root_str = root
        .to_str()
        .ok_or_else(|| DiscoveryError::NonUtf8Root(root.to_path_buf()))?;
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(root_str.trim_end_matches('/')),
        glob::Pattern::escape(extension)
    );

    // Hidden files and directories are never corpus programs.
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|source| DiscoveryError::Pattern {
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

/// Reject corpora where two paths map to the same [`ProgramId`].
pub fn ensure_unique_ids(programs: &[Program]) -> Result<(), DiscoveryError> {
    let mut seen: HashMap<&ProgramId, &Path> = HashMap::with_capacity(programs.len());
    for program in programs {
        if let Some(first) = seen.insert(&program.id, &program.path) {
            return Err(DiscoveryError::DuplicateProgramId {
                id: program.id.clone(),
                first: first.to_path_buf(),
                second: program.path.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discovers_recursively_in_root_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "tests/passing/b.bril");
        touch(tmp.path(), "tests/passing/nested/a.bril");
        touch(tmp.path(), "tests/passing/notes.txt");
        touch(tmp.path(), "benchmarks/passing/raytrace.bril");

        let roots = vec![
            tmp.path().join("tests/passing"),
            tmp.path().join("benchmarks/passing"),
            tmp.path().join("missing"),
        ];
        let programs = discover_programs(&roots, "bril").unwrap();
        let ids: Vec<_> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        let mut first_root = ids[..2].to_vec();
        first_root.sort_unstable();
        assert_eq!(first_root, vec!["a", "b"]);
        assert_eq!(ids[2], "raytrace");
    }

    #[test]
    fn test_dot_prefixed_sources_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("benchmarks/passing");
        touch(&root, "fib.bril");
        touch(&root, "._fib.bril");
        touch(&root, ".cache/fib.bril");

        let programs = discover_programs(&[root.clone()], "bril").unwrap();
        let paths: Vec<_> = programs.iter().map(|p| p.path.clone()).collect();
        assert_eq!(paths, vec![root.join("fib.bril")]);
    }

    #[test]
    fn test_duplicate_ids_across_roots_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "tests/passing/fib.bril");
        touch(tmp.path(), "benchmarks/passing/fib.bril");

        let roots = vec![
            tmp.path().join("tests/passing"),
            tmp.path().join("benchmarks/passing"),
        ];
        let err = discover_programs(&roots, "bril").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CorpusDuplicateProgram);
        match err {
            DiscoveryError::DuplicateProgramId { id, first, second } => {
                assert_eq!(id.as_str(), "fib");
                assert!(first.starts_with(tmp.path().join("tests")));
                assert!(second.starts_with(tmp.path().join("benchmarks")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ensure_unique_ids_accepts_distinct() {
        let programs = vec![
            Program::from_path("x/a.bril").unwrap(),
            Program::from_path("x/b.bril").unwrap(),
        ];
        ensure_unique_ids(&programs).unwrap();
    }
}
