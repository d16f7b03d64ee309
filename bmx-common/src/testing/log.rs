//! Structured test logging.
//!
//! Call [`init_test_logging`] at the top of a test; it is safe to call from
//! every test. Output goes through the test writer so `cargo test` captures
//! it per test, and `BMX_TEST_LOG_JSON=1` switches to JSON lines for CI.
//!
//! ```ignore
//! use bmx_common::testing::{TestPhase, init_test_logging};
//!
//! #[test]
//! fn test_example() {
//!     init_test_logging();
//!     tracing::info!(test = "test_example", phase = %TestPhase::Setup);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Test execution phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPhase {
    Setup,
    Execute,
    Verify,
    Teardown,
}

impl std::fmt::Display for TestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Execute => write!(f, "execute"),
            Self::Verify => write!(f, "verify"),
            Self::Teardown => write!(f, "teardown"),
        }
    }
}

static INIT: Once = Once::new();

/// Initialize test logging once per process.
///
/// `BMX_TEST_LOG_LEVEL` sets the level for the bmx crates (default `debug`).
pub fn init_test_logging() {
    INIT.call_once(|| {
        let level = std::env::var("BMX_TEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let filter = EnvFilter::try_new(format!("bmx={level},bmx_common={level},test={level},warn"))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("BMX_TEST_LOG_JSON").is_ok_and(|v| v == "1");

        let compact = (!json).then(|| {
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .compact()
        });
        let json_layer = json.then(|| {
            fmt::layer()
                .json()
                .with_test_writer()
                .with_file(true)
                .with_line_number(true)
        });

        let _ = tracing_subscriber::registry()
            .with(compact)
            .with(json_layer)
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(TestPhase::Setup.to_string(), "setup");
        assert_eq!(TestPhase::Teardown.to_string(), "teardown");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!(test = "test_init_is_idempotent", phase = %TestPhase::Verify);
    }
}
