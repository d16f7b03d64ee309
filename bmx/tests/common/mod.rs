//! Shared helpers for bmx integration tests.
#![allow(dead_code, unused_imports)]

pub mod assertions;
pub mod fixtures;
pub mod logging;

pub use assertions::{assert_contains, assert_empty_file, assert_path_exists};
pub use fixtures::{FakeToolchain, write_program, write_report};
pub use logging::init_test_logging;
