//! bmx - benchmark-matrix harness CLI.
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use bmx::compare;
use bmx::discovery::Program;
use bmx::{
    AggregateError, CompareError, Compiler, DiscoveryError, DriverError, FourWaySweep,
    MatrixDriver, PreflightError, SweepError, TimingTool,
};
use bmx_common::config::ConfigError;
use bmx_common::errors::ErrorCode;
use bmx_common::{HarnessConfig, LogConfig, LogFormat, ModeSet, init_logging};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "bmx")]
#[command(author, version, about = "Benchmark-matrix harness: compile, time, aggregate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to BMX_CONFIG, then ./bmx.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep every corpus program through every mode, then aggregate
    Run {
        /// Skip the PATH check for the compiler and timing tool
        #[arg(long)]
        skip_preflight: bool,
    },

    /// Sweep a single program through every mode without aggregating
    Sweep {
        program: PathBuf,

        #[arg(long)]
        skip_preflight: bool,
    },

    /// Fold every report under the output root into the aggregate document
    Aggregate {
        /// Report root (defaults to [output] root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Aggregate destination (defaults to [output] aggregate)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Time one program in the four egglog/LLVM optimization combinations
    BenchOne {
        program: PathBuf,

        /// Keep executables and args files after timing
        #[arg(short = 'o', long)]
        keep: bool,

        /// Scratch directory (defaults to [output] scratch)
        #[arg(long)]
        scratch: Option<PathBuf>,

        #[arg(long)]
        skip_preflight: bool,
    },

    /// List the configured modes
    Modes {
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Show the built-in four-way set instead
        #[arg(long)]
        four_way: bool,
    },

    /// Compare benchmark coverage against a baseline aggregate
    Compare {
        #[arg(long)]
        baseline: PathBuf,

        /// Current aggregate (defaults to [output] aggregate)
        #[arg(long)]
        current: Option<PathBuf>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format.into());
    }
    let _logging_guards = match init_logging(&log_config) {
        Ok(guards) => guards,
        Err(err) => {
            eprintln!("error: failed to initialize logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let loaded = HarnessConfig::load(cli.config.as_deref())?;
    match &loaded.file {
        Some(file) => info!(file = %file.display(), "Configuration file loaded"),
        None => debug!("No configuration file; using built-in defaults"),
    }
    for (field, source) in &loaded.sources {
        debug!(field, source = %source, "Configuration source");
    }
    let config = loaded.config;

    match cli.command {
        Commands::Run { skip_preflight } => {
            let modes = config.validate()?;
            preflight(&config, skip_preflight)?;
            let report = MatrixDriver::new(&config, modes).run()?;

            let failures: usize = report
                .sweeps
                .iter()
                .map(|s| s.timing_failures().count())
                .sum();
            println!(
                "Swept {} programs; {} records written to {} ({} empty reports skipped, {} timing failures)",
                report.sweeps.len(),
                report.aggregate.records,
                report.aggregate.destination.display(),
                report.aggregate.skipped_empty,
                failures,
            );
        }

        Commands::Sweep {
            program,
            skip_preflight,
        } => {
            let modes = config.validate()?;
            preflight(&config, skip_preflight)?;
            let program = Program::from_path(program)?;
            let summary = MatrixDriver::new(&config, modes).sweep(&program)?;
            for outcome in &summary.modes {
                match &outcome.report {
                    Some(report) => println!("{:<32} {}", outcome.mode, report.display()),
                    None => println!("{:<32} timing failed (empty report)", outcome.mode),
                }
            }
        }

        Commands::Aggregate { root, output } => {
            let root = root.unwrap_or_else(|| config.output.root.clone());
            let output = output.unwrap_or_else(|| config.output.aggregate.clone());
            let summary = bmx::aggregate(&root, &output)?;
            println!(
                "{} records written to {} ({} empty reports skipped)",
                summary.records,
                summary.destination.display(),
                summary.skipped_empty
            );
        }

        Commands::BenchOne {
            program,
            keep,
            scratch,
            skip_preflight,
        } => {
            preflight(&config, skip_preflight)?;
            let compiler = Compiler::from_config(&config.compiler);
            let timing = TimingTool::from_config(&config.timing);
            let scratch = scratch.unwrap_or_else(|| config.output.scratch.clone());
            let summary = FourWaySweep::new(&compiler, &timing, scratch)
                .keep_artifacts(keep)
                .run(&program)?;
            if summary.kept_artifacts {
                info!(dir = %summary.scratch_dir.display(), "Artifacts kept");
            }
            for outcome in summary.modes.iter().filter(|o| !o.timed) {
                warn!(mode = %outcome.mode, "Mode was not timed");
            }
        }

        Commands::Modes { format, four_way } => {
            let modes = if four_way {
                ModeSet::four_way()
            } else {
                config.validate()?
            };
            print_modes(&modes, format)?;
        }

        Commands::Compare {
            baseline,
            current,
            format,
        } => {
            let current = current.unwrap_or_else(|| config.output.aggregate.clone());
            let diff = compare_files(&baseline, &current)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
                OutputFormat::Text => print!("{}", diff.render_text()),
            }
        }
    }

    Ok(())
}

fn preflight(config: &HarnessConfig, skip: bool) -> Result<()> {
    if skip {
        debug!("Preflight skipped");
        return Ok(());
    }
    let tools = bmx::check_tools(&config.compiler.program, &config.timing.program)?;
    debug!(
        compiler = %tools.compiler.display(),
        timing = %tools.timing.display(),
        "Preflight passed"
    );
    Ok(())
}

fn compare_files(baseline: &Path, current: &Path) -> Result<compare::CoverageDiff> {
    let baseline_records = compare::load_aggregate(baseline)
        .with_context(|| format!("loading baseline {}", baseline.display()))?;
    let current_records = compare::load_aggregate(current)
        .with_context(|| format!("loading current run {}", current.display()))?;
    Ok(compare::compare(&baseline_records, &current_records))
}

fn print_modes(modes: &ModeSet, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(modes)?),
        OutputFormat::Text => {
            for mode in modes {
                println!(
                    "{:<32} {:<32} {}",
                    mode.name(),
                    mode.run_method(),
                    mode.render_options().join(" ")
                );
            }
        }
    }
    Ok(())
}

/// Find the catalog code for the first typed error in the chain.
fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<DriverError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<SweepError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<AggregateError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<DiscoveryError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<PreflightError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<CompareError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<ConfigError>().map(ConfigError::code)
        }
    })
}

/// One-line rendering of an error and its causes.
///
/// Library errors already embed their source in their message, so a cause
/// whose text the previous link already contains is not printed again.
fn render_error_chain(err: &anyhow::Error) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut previous = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if pieces.is_empty() || !previous.contains(&text) {
            pieces.push(text.clone());
        }
        previous = text;
    }
    pieces.join(": ")
}

fn report_error(err: &anyhow::Error) {
    let code = error_code(err);
    let message = render_error_chain(err);
    match code {
        Some(code) => eprintln!("error[{}]: {message}", code.code_string()),
        None => eprintln!("error: {message}"),
    }

    if let Some(preflight) = err.downcast_ref::<PreflightError>() {
        eprintln!("  hint: {}", preflight.hint());
    }
    for step in code.map(|c| c.remediation()).unwrap_or_default() {
        eprintln!("  - {step}");
    }
    if let Some(stderr) = compile_stderr(err)
        && !stderr.trim().is_empty()
    {
        eprintln!("compiler stderr:\n{}", stderr.trim_end());
    }
}

fn compile_stderr(err: &anyhow::Error) -> Option<&str> {
    err.chain().find_map(|cause| match cause.downcast_ref::<SweepError>() {
        Some(SweepError::CompileFailed { source, .. }) => Some(source.stderr()),
        _ => None,
    })
}
