//! Error codes, messages and remediation steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all harness failure scenarios.
///
/// Each variant maps to a unique code in the `BMX-Exxx` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// Explicitly requested configuration file does not exist
    ConfigNotFound,
    /// Configuration file could not be read
    ConfigReadError,
    /// Configuration file contains invalid TOML
    ConfigParseError,
    /// Environment override has an invalid value
    ConfigEnvError,
    /// Configuration contains invalid values
    ConfigValidationError,
    /// Mode list is empty
    ConfigNoModes,
    /// A mode has an invalid or duplicate name
    ConfigInvalidMode,

    // =========================================================================
    // Corpus Errors (E100-E199)
    // =========================================================================
    /// Corpus glob pattern is invalid
    CorpusPatternError,
    /// Corpus directory could not be walked
    CorpusWalkError,
    /// Two programs share the same identifier
    CorpusDuplicateProgram,
    /// Program path has no usable identifier
    CorpusInvalidProgram,

    // =========================================================================
    // Build Errors (E200-E299)
    // =========================================================================
    /// Program output directory already exists
    BuildOutputExists,
    /// Output directory could not be created
    BuildOutputCreateFailed,
    /// Compiler exited with a failure status
    BuildCompileFailed,
    /// Runtime-arguments side-car is missing or unreadable
    BuildArgsMissing,
    /// Compiler executable could not be started
    BuildCompilerUnavailable,

    // =========================================================================
    // Timing Errors (E300-E399)
    // =========================================================================
    /// Timing tool executable could not be started
    TimingToolUnavailable,
    /// Timing report file could not be reset
    TimingReportResetFailed,

    // =========================================================================
    // Report Errors (E400-E499)
    // =========================================================================
    /// A non-empty report is not valid JSON
    ReportCorrupt,
    /// Report tree could not be walked
    ReportWalkError,
    /// Aggregate document could not be written
    ReportWriteFailed,
    /// Aggregate document could not be loaded
    ReportLoadFailed,
}

/// Error category grouping related codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Config,
    Corpus,
    Build,
    Timing,
    Report,
}

/// Full catalog entry for one error code.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub code: String,
    pub category: ErrorCategory,
    pub message: &'static str,
    pub remediation: &'static [&'static str],
}

impl ErrorCode {
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigNotFound => 1,
            Self::ConfigReadError => 2,
            Self::ConfigParseError => 3,
            Self::ConfigEnvError => 4,
            Self::ConfigValidationError => 5,
            Self::ConfigNoModes => 6,
            Self::ConfigInvalidMode => 7,

            Self::CorpusPatternError => 100,
            Self::CorpusWalkError => 101,
            Self::CorpusDuplicateProgram => 102,
            Self::CorpusInvalidProgram => 103,

            Self::BuildOutputExists => 200,
            Self::BuildOutputCreateFailed => 201,
            Self::BuildCompileFailed => 202,
            Self::BuildArgsMissing => 203,
            Self::BuildCompilerUnavailable => 204,

            Self::TimingToolUnavailable => 300,
            Self::TimingReportResetFailed => 301,

            Self::ReportCorrupt => 400,
            Self::ReportWalkError => 401,
            Self::ReportWriteFailed => 402,
            Self::ReportLoadFailed => 403,
        }
    }

    /// Code in `BMX-Exxx` form.
    pub fn code_string(&self) -> String {
        format!("BMX-E{:03}", self.code_number())
    }

    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            0..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Corpus,
            200..=299 => ErrorCategory::Build,
            300..=399 => ErrorCategory::Timing,
            _ => ErrorCategory::Report,
        }
    }

    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message(),
            remediation: self.remediation(),
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Configuration file not found",
            Self::ConfigReadError => "Failed to read configuration file",
            Self::ConfigParseError => "Configuration file is not valid TOML",
            Self::ConfigEnvError => "Invalid environment variable override",
            Self::ConfigValidationError => "Configuration contains invalid values",
            Self::ConfigNoModes => "No compilation modes configured",
            Self::ConfigInvalidMode => "Invalid compilation mode",
            Self::CorpusPatternError => "Invalid corpus search pattern",
            Self::CorpusWalkError => "Failed to walk corpus directory",
            Self::CorpusDuplicateProgram => "Two corpus programs share an identifier",
            Self::CorpusInvalidProgram => "Corpus program has no usable identifier",
            Self::BuildOutputExists => "Program output directory already exists",
            Self::BuildOutputCreateFailed => "Failed to create output directory",
            Self::BuildCompileFailed => "Compiler exited with an error",
            Self::BuildArgsMissing => "Runtime arguments file missing or unreadable",
            Self::BuildCompilerUnavailable => "Compiler could not be started",
            Self::TimingToolUnavailable => "Timing tool could not be started",
            Self::TimingReportResetFailed => "Failed to reset timing report",
            Self::ReportCorrupt => "Timing report is not valid JSON",
            Self::ReportWalkError => "Failed to walk report directory",
            Self::ReportWriteFailed => "Failed to write aggregate document",
            Self::ReportLoadFailed => "Failed to load aggregate document",
        }
    }

    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigNotFound => &[
                "Check the path passed to --config or BMX_CONFIG",
                "Omit --config to use built-in defaults",
            ],
            Self::ConfigReadError => &["Check file permissions on the configuration file"],
            Self::ConfigParseError => &[
                "Validate the file with a TOML linter",
                "Compare against the documented [compiler]/[timing]/[[modes]] tables",
            ],
            Self::ConfigEnvError => &["Unset or correct the BMX_* variable named in the error"],
            Self::ConfigValidationError => &["Fix the configuration value named in the error"],
            Self::ConfigNoModes => &["Add at least one [[modes]] entry or remove the empty list"],
            Self::ConfigInvalidMode => &[
                "Mode names must be unique single path components",
                "Names may not end in '-args' or '.json'",
            ],
            Self::CorpusPatternError => &["Check corpus roots and extension for glob metacharacters"],
            Self::CorpusWalkError => &["Check permissions on the corpus directories"],
            Self::CorpusDuplicateProgram => &[
                "Rename one of the programs so file stems are unique",
                "Or remove one root from [corpus] roots",
            ],
            Self::CorpusInvalidProgram => &["Give the program a non-empty UTF-8 file name"],
            Self::BuildOutputExists => &[
                "Remove the output root (default tmp/bench) before re-running",
                "Or point [output] root at a fresh directory",
            ],
            Self::BuildOutputCreateFailed => &["Check permissions on the output root"],
            Self::BuildCompileFailed => &[
                "Run the compiler command from the debug log by hand",
                "Check compiler stderr included in the error",
            ],
            Self::BuildArgsMissing => &["Confirm the compiler writes <output>-args next to the executable"],
            Self::BuildCompilerUnavailable => &["Install the compiler or set [compiler] program / BMX_COMPILER"],
            Self::TimingToolUnavailable => &[
                "Install hyperfine (cargo install hyperfine)",
                "Or set [timing] program / BMX_TIMING_TOOL",
            ],
            Self::TimingReportResetFailed => &["Check permissions on the program output directory"],
            Self::ReportCorrupt => &[
                "Inspect or delete the report named in the error",
                "Re-run the sweep for that benchmark",
            ],
            Self::ReportWalkError => &["Check permissions on the output root"],
            Self::ReportWriteFailed => &["Check that the aggregate destination directory is writable"],
            Self::ReportLoadFailed => &["Confirm the file is an aggregate document produced by bmx"],
        }
    }

    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigNotFound,
            Self::ConfigReadError,
            Self::ConfigParseError,
            Self::ConfigEnvError,
            Self::ConfigValidationError,
            Self::ConfigNoModes,
            Self::ConfigInvalidMode,
            Self::CorpusPatternError,
            Self::CorpusWalkError,
            Self::CorpusDuplicateProgram,
            Self::CorpusInvalidProgram,
            Self::BuildOutputExists,
            Self::BuildOutputCreateFailed,
            Self::BuildCompileFailed,
            Self::BuildArgsMissing,
            Self::BuildCompilerUnavailable,
            Self::TimingToolUnavailable,
            Self::TimingReportResetFailed,
            Self::ReportCorrupt,
            Self::ReportWalkError,
            Self::ReportWriteFailed,
            Self::ReportLoadFailed,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

impl ErrorEntry {
    /// Code, message and remediation steps, one per line.
    pub fn format_full(&self) -> String {
        let mut out = format!("[{}] {}", self.code, self.message);
        for step in self.remediation {
            out.push_str("\n  - ");
            out.push_str(step);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_code_numbers_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::all() {
            assert!(
                seen.insert(code.code_number()),
                "duplicate code number for {code:?}"
            );
        }
    }

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.code_string(), "BMX-E001");
        assert_eq!(ErrorCode::ReportCorrupt.code_string(), "BMX-E400");
        assert_eq!(ErrorCode::BuildCompileFailed.to_string(), "BMX-E202");
    }

    #[test]
    fn test_category_ranges() {
        assert_eq!(ErrorCode::ConfigInvalidMode.category(), ErrorCategory::Config);
        assert_eq!(ErrorCode::CorpusDuplicateProgram.category(), ErrorCategory::Corpus);
        assert_eq!(ErrorCode::BuildArgsMissing.category(), ErrorCategory::Build);
        assert_eq!(ErrorCode::TimingToolUnavailable.category(), ErrorCategory::Timing);
        assert_eq!(ErrorCode::ReportWriteFailed.category(), ErrorCategory::Report);
    }

    #[test]
    fn test_all_errors_have_remediation() {
        for code in ErrorCode::all() {
            assert!(!code.message().is_empty());
            assert!(
                !code.remediation().is_empty(),
                "{code:?} has no remediation"
            );
        }
    }

    #[test]
    fn test_format_full() {
        let text = ErrorCode::BuildOutputExists.entry().format_full();
        assert!(text.starts_with("[BMX-E200] Program output directory already exists"));
        assert!(text.contains("\n  - Remove the output root"));
    }
}
