//! Harness configuration: collaborator commands, corpus, output layout and
//! the mode list.
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file, then `BMX_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::env::{EnvError, EnvParser};
use super::source::ConfigSource;
use crate::errors::ErrorCode;
use crate::mode::{Mode, ModeError, ModeSet};

/// Configuration file picked up from the working directory when neither
/// `--config` nor `BMX_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "bmx.toml";

/// Top-level tables a configuration file can set.
const FILE_SECTIONS: [&str; 5] = ["compiler", "timing", "corpus", "output", "modes"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid environment overrides: {}", join_env_errors(.0))]
    Env(Vec<EnvError>),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Mode(#[from] ModeError),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ConfigNotFound,
            Self::Read { .. } => ErrorCode::ConfigReadError,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::Env(_) => ErrorCode::ConfigEnvError,
            Self::Invalid(_) => ErrorCode::ConfigValidationError,
            Self::Mode(err) => err.code(),
        }
    }
}

fn join_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// How to invoke the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the source path.
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: vec!["run".into(), "--release".into(), "--".into()],
        }
    }
}

/// How to invoke the timing tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub program: String,
    /// Arguments placed before the timing flags.
    pub args: Vec<String>,
    /// Warm-up runs before measurement.
    pub warmup: u32,
    /// Upper bound on measured runs; `None` leaves it to the tool.
    pub max_runs: Option<u32>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            program: "hyperfine".to_string(),
            args: Vec::new(),
            warmup: 2,
            max_runs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Directories scanned recursively for programs, in order.
    pub roots: Vec<PathBuf>,
    /// Source extension without the leading dot.
    pub extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("tests/passing"),
                PathBuf::from("benchmarks/passing"),
            ],
            extension: "bril".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Root of the per-program artifact tree.
    pub root: PathBuf,
    /// Destination of the aggregate document.
    pub aggregate: PathBuf,
    /// Working directory for `bench-one`.
    pub scratch: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tmp/bench"),
            aggregate: PathBuf::from("nightly/data/profile.json"),
            scratch: PathBuf::from("tmp/bench-one"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub compiler: CompilerConfig,
    pub timing: TimingConfig,
    pub corpus: CorpusConfig,
    pub output: OutputConfig,
    pub modes: Vec<Mode>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: CompilerConfig::default(),
            timing: TimingConfig::default(),
            corpus: CorpusConfig::default(),
            output: OutputConfig::default(),
            modes: ModeSet::default_matrix().into_vec(),
        }
    }
}

/// A resolved configuration plus where its values came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: HarnessConfig,
    /// File the configuration was read from, if any.
    pub file: Option<PathBuf>,
    /// Sections set by the file, then fields overridden by the environment.
    /// A later entry wins over an earlier one for the same field.
    pub sources: Vec<(&'static str, ConfigSource)>,
}

impl LoadedConfig {
    /// Which layer supplied `field` (for example `timing.warmup`).
    pub fn source_of(&self, field: &str) -> ConfigSource {
        self.sources
            .iter()
            .rev()
            .find(|(key, _)| {
                field == *key
                    || field
                        .strip_prefix(*key)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(|(_, source)| source.clone())
            .unwrap_or(ConfigSource::Default)
    }
}

impl HarnessConfig {
    /// Resolve configuration from the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        Self::load_with(explicit, EnvParser::new())
    }

    /// Resolve configuration using the given environment parser.
    ///
    /// An explicit path or `BMX_CONFIG` must exist; the default `bmx.toml`
    /// is only read when present.
    pub fn load_with(explicit: Option<&Path>, mut env: EnvParser) -> Result<LoadedConfig, ConfigError> {
        let env_path = env.get_path("CONFIG", PathBuf::from(DEFAULT_CONFIG_FILE));
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => {
                let required = env_path.is_from_env();
                (env_path.value, required)
            }
        };

        let (mut config, mut sources, file) = if path.is_file() {
            let (config, sections) = Self::from_file_with_sections(&path)?;
            (config, sections, Some(path))
        } else if required {
            return Err(ConfigError::NotFound(path));
        } else {
            (Self::default(), Vec::new(), None)
        };

        let overrides = config.apply_env(&mut env);
        if env.has_errors() {
            return Err(ConfigError::Env(env.take_errors()));
        }

        debug!(
            file = ?file,
            file_sections = sources.len(),
            overrides = overrides.len(),
            modes = config.modes.len(),
            "Configuration resolved"
        );

        sources.extend(overrides);
        Ok(LoadedConfig {
            config,
            file,
            sources,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file_with_sections(path).map(|(config, _)| config)
    }

    /// Parse `path`, also returning a file source for every top-level
    /// section it sets.
    fn from_file_with_sections(
        path: &Path,
    ) -> Result<(Self, Vec<(&'static str, ConfigSource)>), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let config = Self::from_toml_str(&contents).map_err(parse_error)?;
        let table: toml::Table = toml::from_str(&contents).map_err(parse_error)?;

        let sections = FILE_SECTIONS
            .into_iter()
            .filter(|section| table.contains_key(*section))
            .map(|section| (section, ConfigSource::File(path.to_path_buf())))
            .collect();
        Ok((config, sections))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `BMX_*` overrides, returning which fields changed.
    pub fn apply_env(&mut self, env: &mut EnvParser) -> Vec<(&'static str, ConfigSource)> {
        let mut overrides = Vec::new();

        let compiler = env.get_string("COMPILER", &self.compiler.program);
        if compiler.is_from_env() {
            self.compiler.program = compiler.value;
            overrides.push(("compiler.program", compiler.source));
        }

        let timing = env.get_string("TIMING_TOOL", &self.timing.program);
        if timing.is_from_env() {
            self.timing.program = timing.value;
            overrides.push(("timing.program", timing.source));
        }

        let warmup = env.get_u32_range("WARMUP", self.timing.warmup, 0, 100);
        if warmup.is_from_env() {
            self.timing.warmup = warmup.value;
            overrides.push(("timing.warmup", warmup.source));
        }

        let max_runs = env.get_optional_u32("MAX_RUNS", self.timing.max_runs);
        if max_runs.is_from_env() {
            self.timing.max_runs = max_runs.value;
            overrides.push(("timing.max_runs", max_runs.source));
        }

        let root = env.get_path("OUTPUT_ROOT", self.output.root.clone());
        if root.is_from_env() {
            self.output.root = root.value;
            overrides.push(("output.root", root.source));
        }

        let aggregate = env.get_path("AGGREGATE_PATH", self.output.aggregate.clone());
        if aggregate.is_from_env() {
            self.output.aggregate = aggregate.value;
            overrides.push(("output.aggregate", aggregate.source));
        }

        overrides
    }

    /// Check the configuration and build the mode set from it.
    pub fn validate(&self) -> Result<ModeSet, ConfigError> {
        if self.compiler.program.trim().is_empty() {
            return Err(ConfigError::Invalid("compiler.program is empty".into()));
        }
        if self.timing.program.trim().is_empty() {
            return Err(ConfigError::Invalid("timing.program is empty".into()));
        }
        let extension = self.corpus.extension.trim();
        if extension.is_empty() || extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "corpus.extension must be non-empty and given without a leading dot, got '{}'",
                self.corpus.extension
            )));
        }
        if self.corpus.roots.is_empty() {
            return Err(ConfigError::Invalid("corpus.roots is empty".into()));
        }
        Ok(ModeSet::new(self.modes.clone())?)
    }
}
