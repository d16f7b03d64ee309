use bmx::{Compiler, TimingTool};
use bmx_common::config::{CompilerConfig, CorpusConfig, OutputConfig, TimingConfig};
use bmx_common::{HarnessConfig, Mode};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in compiler: records its argv, fails with status 7 on sources that
/// contain the word `broken`, otherwise writes `<out>` and `<out>-args`.
const FAKE_COMPILER: &str = r#"#!/bin/sh
echo "$@" >> "__LOG__"
src="$1"
shift
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if grep -q broken "$src"; then
  echo "error: cannot compile $src" >&2
  exit 7
fi
printf '#!/bin/sh\nexit 0\n' > "$out"
printf '10 20\n' > "$out-args"
"#;

/// Stand-in timing tool: records its argv, fails on commands matching the
/// configured substring, otherwise exports a minimal report when asked.
const FAKE_TIMER: &str = r#"#!/bin/sh
echo "$@" >> "__LOG__"
export_path=""
cmd=""
while [ $# -gt 0 ]; do
  case "$1" in
    --warmup|--max-runs) shift 2 ;;
    --export-json) export_path="$2"; shift 2 ;;
    *) cmd="$1"; shift ;;
  esac
done
case "$cmd" in
  *"__FAIL__"*) echo "command failed: $cmd" >&2; exit 1 ;;
esac
if [ -n "$export_path" ]; then
  printf '{"results":[{"command":"%s","mean":0.5,"times":[0.4,0.6]}]}' "$cmd" > "$export_path"
fi
"#;

const NEVER_MATCHES: &str = "__bmx_never_fails__";

/// Shell-script compiler and timing tool in a temp directory.
pub struct FakeToolchain {
    pub dir: TempDir,
    pub compiler_script: PathBuf,
    pub timing_script: PathBuf,
    pub compile_log: PathBuf,
    pub timing_log: PathBuf,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::failing_timing_on(NEVER_MATCHES)
    }

    /// Timing fails for any command containing `pattern`.
    pub fn failing_timing_on(pattern: &str) -> Self {
        crate::test_log!(pattern, "FIXTURE: Creating fake toolchain");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let compiler_script = dir.path().join("fake-compiler.sh");
        let timing_script = dir.path().join("fake-hyperfine.sh");
        let compile_log = dir.path().join("compile.log");
        let timing_log = dir.path().join("timing.log");

        fs::write(
            &compiler_script,
            FAKE_COMPILER.replace("__LOG__", &compile_log.to_string_lossy()),
        )
        .expect("Failed to write fake compiler");
        fs::write(
            &timing_script,
            FAKE_TIMER
                .replace("__LOG__", &timing_log.to_string_lossy())
                .replace("__FAIL__", pattern),
        )
        .expect("Failed to write fake timing tool");

        Self {
            dir,
            compiler_script,
            timing_script,
            compile_log,
            timing_log,
        }
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::from_config(&self.compiler_config())
    }

    pub fn timing(&self) -> TimingTool {
        TimingTool::from_config(&self.timing_config())
    }

    fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            program: "sh".to_string(),
            args: vec![self.compiler_script.to_string_lossy().into_owned()],
        }
    }

    fn timing_config(&self) -> TimingConfig {
        TimingConfig {
            program: "sh".to_string(),
            args: vec![self.timing_script.to_string_lossy().into_owned()],
            ..TimingConfig::default()
        }
    }

    /// Harness configuration rooted in `workspace` with two test modes.
    pub fn config(&self, workspace: &Path) -> HarnessConfig {
        HarnessConfig {
            compiler: self.compiler_config(),
            timing: self.timing_config(),
            corpus: CorpusConfig {
                roots: vec![workspace.join("corpus")],
                extension: "bril".to_string(),
            },
            output: OutputConfig {
                root: workspace.join("out/bench"),
                aggregate: workspace.join("out/profile.json"),
                scratch: workspace.join("out/bench-one"),
            },
            modes: vec![
                Mode::new("m1", "compile-brilift").with_option("optimize-egglog", true),
                Mode::new("m2", "compile-bril-llvm").with_option("optimize-egglog", false),
            ],
        }
    }

    pub fn compile_invocations(&self) -> Vec<String> {
        read_lines(&self.compile_log)
    }

    pub fn timing_invocations(&self) -> Vec<String> {
        read_lines(&self.timing_log)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Write a source file into `<workspace>/corpus/<rel>`.
pub fn write_program(workspace: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = workspace.join("corpus").join(rel);
    fs::create_dir_all(path.parent().expect("program has a parent"))
        .expect("Failed to create corpus dir");
    fs::write(&path, contents).expect("Failed to write program");
    path
}

/// Write `<root>/<benchmark>/<run_method>.json` with `contents`.
pub fn write_report(root: &Path, benchmark: &str, run_method: &str, contents: &str) -> PathBuf {
    let dir = root.join(benchmark);
    fs::create_dir_all(&dir).expect("Failed to create report dir");
    let path = dir.join(format!("{run_method}.json"));
    fs::write(&path, contents).expect("Failed to write report");
    path
}
