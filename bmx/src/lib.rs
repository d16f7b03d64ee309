//! Benchmark-matrix harness.
//!
//! Every corpus program is compiled once per configured mode, each
//! executable is timed by an external tool, and the per-run reports are
//! folded into a single aggregate document:
//!
//! ```text
//! discovery -> sweep (per program, per mode) -> aggregate
//! ```
//!
//! All work is sequential and blocking. Timing numbers are only meaningful
//! when the harness has the machine to itself.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod bench_one;
pub mod compare;
pub mod compiler;
pub mod discovery;
pub mod driver;
pub mod preflight;
pub mod process;
pub mod sweep;
pub mod timing;

pub use aggregate::{AggregateError, AggregateSummary, aggregate, collect_records, write_aggregate};
pub use bench_one::{FourWayOutcome, FourWaySummary, FourWaySweep};
pub use compare::{CompareError, CoverageDiff, compare, load_aggregate};
pub use compiler::Compiler;
pub use discovery::{DiscoveryError, Program, discover_programs, ensure_unique_ids};
pub use driver::{DriverError, MatrixDriver, MatrixReport};
pub use preflight::{PreflightError, ToolReport, ToolRole, check_tools};
pub use process::{OutputMode, ProcessError, ProcessOutput, ProcessSpec};
pub use sweep::{ModeOutcome, SweepError, SweepRunner, SweepSummary};
pub use timing::TimingTool;
