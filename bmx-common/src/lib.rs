//! Shared types and utilities for the bmx benchmark-matrix harness.
//!
//! The harness compiles every corpus program once per [`Mode`], times each
//! executable with an external timing tool, and folds the per-run reports
//! into one aggregate document. This crate owns the pieces both halves of
//! that pipeline agree on: the mode model, the on-disk layout, the aggregate
//! record shape, configuration, logging, and the error-code catalog.

pub mod config;
pub mod errors;
pub mod layout;
pub mod logging;
pub mod mode;
pub mod record;
pub mod testing;
pub mod util;

pub use config::{ConfigError, HarnessConfig, LoadedConfig};
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry};
pub use layout::{ArtifactPaths, LayoutError, ProgramId, RunKey, key_for, path_for};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use mode::{Mode, ModeError, ModeSet};
pub use record::AggregateRecord;
