//! Configuration system for bmx.
//!
//! - Typed `BMX_*` environment overrides with error collection
//! - TOML configuration file with per-section defaults
//! - Source tracking for overridden values

pub mod env;
pub mod harness;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use harness::{
    CompilerConfig, ConfigError, CorpusConfig, DEFAULT_CONFIG_FILE, HarnessConfig, LoadedConfig,
    OutputConfig, TimingConfig,
};
pub use source::{ConfigSource, Sourced};
