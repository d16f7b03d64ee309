//! Four-way sweep against the fake toolchain.
#![cfg(unix)]

mod common;

use bmx::FourWaySweep;
use bmx_common::errors::ErrorCode;
use bmx_common::testing::TestPhase;
use common::{FakeToolchain, assert_contains, assert_path_exists, init_test_logging, write_program};
use std::fs;
use tempfile::TempDir;

const FOUR_WAY: [&str; 4] = [
    "egglog_noopt_llvm_noopt",
    "egglog_noopt_llvm_opt",
    "egglog_opt_llvm_noopt",
    "egglog_opt_llvm_opt",
];

#[test]
fn test_artifacts_removed_by_default() {
    init_test_logging();
    test_log!(test = "test_artifacts_removed_by_default", phase = %TestPhase::Setup);

    let workspace = TempDir::new().unwrap();
    let toolchain = FakeToolchain::new();
    let program = write_program(workspace.path(), "fib.bril", "@main { }");
    let scratch = workspace.path().join("scratch");
    let compiler = toolchain.compiler();
    let timing = toolchain.timing();

    test_log!(test = "test_artifacts_removed_by_default", phase = %TestPhase::Execute);
    let summary = FourWaySweep::new(&compiler, &timing, &scratch)
        .run(&program)
        .unwrap();

    test_log!(test = "test_artifacts_removed_by_default", phase = %TestPhase::Verify);
    let modes: Vec<&str> = summary.modes.iter().map(|m| m.mode.as_str()).collect();
    assert_eq!(modes, FOUR_WAY);
    assert!(summary.modes.iter().all(|m| m.timed));
    assert!(!summary.kept_artifacts);

    let dir = scratch.join("fib");
    assert_path_exists(&dir);
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

    let timings = toolchain.timing_invocations();
    assert_eq!(timings.len(), 4);
    for line in &timings {
        assert!(line.starts_with("--warmup 3 --max-runs 100 "), "{line}");
        assert!(!line.contains("--export-json"), "{line}");
    }

    let compiles = toolchain.compile_invocations();
    assert_contains(
        &compiles[1],
        "--run-mode llvm --optimize-egglog false --optimize-bril-llvm true -o",
    );
}

#[test]
fn test_keep_leaves_executables_and_args() {
    init_test_logging();
    let workspace = TempDir::new().unwrap();
    let toolchain = FakeToolchain::new();
    let program = write_program(workspace.path(), "fib.bril", "@main { }");
    let scratch = workspace.path().join("scratch");
    let compiler = toolchain.compiler();
    let timing = toolchain.timing();

    let summary = FourWaySweep::new(&compiler, &timing, &scratch)
        .keep_artifacts(true)
        .run(&program)
        .unwrap();
    assert!(summary.kept_artifacts);

    for mode in FOUR_WAY {
        assert_path_exists(&scratch.join("fib").join(mode));
        assert_path_exists(&scratch.join("fib").join(format!("{mode}-args")));
        assert!(!scratch.join("fib").join(format!("{mode}.json")).exists());
    }
}

#[test]
fn test_timing_failure_skips_mode() {
    init_test_logging();
    let workspace = TempDir::new().unwrap();
    let toolchain = FakeToolchain::failing_timing_on("egglog_opt_llvm_noopt ");
    let program = write_program(workspace.path(), "fib.bril", "@main { }");
    let compiler = toolchain.compiler();
    let timing = toolchain.timing();

    let summary = FourWaySweep::new(&compiler, &timing, workspace.path().join("scratch"))
        .run(&program)
        .unwrap();
    let untimed: Vec<&str> = summary
        .modes
        .iter()
        .filter(|m| !m.timed)
        .map(|m| m.mode.as_str())
        .collect();
    assert_eq!(untimed, vec!["egglog_opt_llvm_noopt"]);
}

#[test]
fn test_compile_failure_cleans_up_and_stops() {
    init_test_logging();
    let workspace = TempDir::new().unwrap();
    let toolchain = FakeToolchain::new();
    let program = write_program(workspace.path(), "bad.bril", "broken");
    let compiler = toolchain.compiler();
    let timing = toolchain.timing();

    let err = FourWaySweep::new(&compiler, &timing, workspace.path().join("scratch"))
        .run(&program)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BuildCompileFailed);
    assert_eq!(err.compile_exit_code(), Some(7));
    assert_eq!(toolchain.compile_invocations().len(), 1);
}
