//! Test support shared by the bmx crates.

pub mod log;

pub use log::{TestPhase, init_test_logging};
