//! Preflight checks run before any sweep starts.
//!
//! Resolves the compiler and timing-tool programs on `PATH` so a missing
//! `hyperfine` is reported before the first (possibly long) compile.

use bmx_common::errors::ErrorCode;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use which::which;

/// Which collaborator a preflight check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    Compiler,
    TimingTool,
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compiler => write!(f, "compiler"),
            Self::TimingTool => write!(f, "timing tool"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("{role} '{program}' not found: {source}")]
    MissingTool {
        role: ToolRole,
        program: String,
        #[source]
        source: which::Error,
    },
}

impl PreflightError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingTool {
                role: ToolRole::Compiler,
                ..
            } => ErrorCode::BuildCompilerUnavailable,
            Self::MissingTool {
                role: ToolRole::TimingTool,
                ..
            } => ErrorCode::TimingToolUnavailable,
        }
    }

    /// One-line fix for the missing tool.
    pub fn hint(&self) -> String {
        match self {
            Self::MissingTool {
                role: ToolRole::Compiler,
                program,
                ..
            } => format!("install '{program}' or set [compiler] program / BMX_COMPILER"),
            Self::MissingTool {
                role: ToolRole::TimingTool,
                program,
                ..
            } => format!(
                "install '{program}' (e.g. `cargo install hyperfine`) or set [timing] program / BMX_TIMING_TOOL"
            ),
        }
    }
}

/// Resolved locations of both collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolReport {
    pub compiler: PathBuf,
    pub timing: PathBuf,
}

pub fn check_tools(compiler: &str, timing: &str) -> Result<ToolReport, PreflightError> {
    let compiler = resolve(ToolRole::Compiler, compiler)?;
    let timing = resolve(ToolRole::TimingTool, timing)?;
    Ok(ToolReport { compiler, timing })
}

fn resolve(role: ToolRole, program: &str) -> Result<PathBuf, PreflightError> {
    let path = which(program).map_err(|source| PreflightError::MissingTool {
        role,
        program: program.to_string(),
        source,
    })?;
    debug!(%role, program, resolved = %path.display(), "Tool resolved");
    Ok(path)
}
