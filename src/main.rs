use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use owo_colors::Stream;
use tracing_subscriber::EnvFilter;

use benchpair::config::{self, RunPlan};
use benchpair::display;
use benchpair::runner::{self, OutputDirs};
use benchpair::types::{BenchmarkTarget, RunSample, Variant};

#[derive(Parser)]
#[command(
    name = "benchpair",
    version,
    about = "Time a baseline and a modified benchmark executable side by side"
)]
struct Cli {
    /// Measured runs per variant (warmup runs come on top)
    #[arg(short = 'n', long = "runs", default_value_t = config::DEFAULT_MEASURED_RUNS)]
    runs: usize,

    /// Leading warmup runs per variant, timed but discarded
    #[arg(short = 'd', long = "discard", default_value_t = config::DEFAULT_WARMUP_RUNS)]
    discard: usize,

    /// TOML file listing targets and the child environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only benchmark these targets (repeatable)
    #[arg(short, long = "target")]
    targets: Vec<String>,

    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    /// Seconds to pause after every run
    #[arg(long, default_value_t = config::DEFAULT_RUN_DELAY_SECS)]
    run_delay: f64,

    /// Seconds to pause between the normal and modified phases
    #[arg(long, default_value_t = config::DEFAULT_PHASE_DELAY_SECS)]
    phase_delay: f64,

    /// Skip running; summarize and archive the existing result files
    #[arg(long)]
    summarize_only: bool,

    /// Print the final reports as JSON (progress moves to stderr)
    #[arg(long)]
    json: bool,
}

fn delay(secs: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow::anyhow!("--{} must be a non-negative number of seconds", flag))
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let plan = RunPlan::new(
        cli.runs,
        cli.discard,
        delay(cli.run_delay, "run-delay")?,
        delay(cli.phase_delay, "phase-delay")?,
    )?;

    let target_config = config::resolve(cli.config.as_deref())?;
    let targets = target_config.select(&cli.targets)?;

    let dirs = OutputDirs {
        results: cli.results_dir,
        logs: cli.logs_dir,
    };
    dirs.check()?;

    let status_stream = if cli.json {
        Stream::Stderr
    } else {
        Stream::Stdout
    };
    let mut progress = |target: &BenchmarkTarget, variant: Variant, sample: &RunSample| {
        let line = display::format_progress(&target.name, variant, sample, status_stream);
        if cli.json {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };

    if !cli.summarize_only {
        let banner = display::format_banner(&plan);
        if cli.json {
            eprintln!("{}", banner);
        } else {
            println!("{}", banner);
        }
    }

    let mut reports = Vec::with_capacity(targets.len());
    for target in &targets {
        let measurement = if cli.summarize_only {
            runner::summarize_target(target, &target_config.env, &dirs)?
        } else {
            runner::run_target(target, &target_config.env, &plan, &dirs, &mut progress)?
        };

        // Must precede archiving.
        let comparison = display::format_comparison(&measurement.comparison, status_stream);
        if cli.json {
            eprint!("{}", comparison);
        } else {
            print!("{}", comparison);
        }

        let report = runner::archive_measurement(measurement, &dirs)?;
        if !cli.json {
            print!("{}", display::format_archived(&report.archived, Stream::Stdout));
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", display::format_json(&reports));
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
