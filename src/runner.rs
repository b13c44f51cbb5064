use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info};

use crate::config::RunPlan;
use crate::errors::BenchError;
use crate::results;
use crate::stats;
use crate::types::{
    BenchmarkTarget, Comparison, Measurement, RunSample, SampleSet, TargetReport, Variant,
};

/// Where result files are written and archived. Both must already exist.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub results: PathBuf,
    pub logs: PathBuf,
}

impl OutputDirs {
    pub fn check(&self) -> Result<()> {
        results::ensure_dir(&self.results)?;
        results::ensure_dir(&self.logs)
    }
}

/// Called once per timed run, warmups included.
pub type ProgressFn<'a> = dyn FnMut(&BenchmarkTarget, Variant, &RunSample) + 'a;

/// A single executable with its arguments and the environment it gets.
///
/// The environment is layered over the inherited one for this spawn only;
/// the runner's own environment is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn for_target(
        target: &BenchmarkTarget,
        variant: Variant,
        env: &BTreeMap<String, String>,
    ) -> Self {
        Invocation {
            program: target.executable(variant),
            args: target.args.clone(),
            env: env.clone(),
        }
    }

    /// Program path and arguments joined by spaces, as recorded in the info file.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// Run to completion and return the wall-clock time in seconds.
    pub fn run_once(&self) -> Result<f64> {
        let mut cmd = self.command();
        debug!(program = %self.program.display(), args = ?self.args, "spawning");

        let start = Instant::now();
        let status = cmd.status().map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                BenchError::ExecutableNotFound {
                    path: self.program.clone(),
                }
            } else {
                BenchError::SpawnFailed {
                    path: self.program.clone(),
                    source,
                }
            }
        })?;
        let elapsed = start.elapsed().as_secs_f64();

        debug!(program = %self.program.display(), %status, elapsed, "exited");
        if !status.success() {
            return Err(BenchError::NonZeroExit {
                path: self.program.clone(),
                status,
            }
            .into());
        }
        Ok(elapsed)
    }
}

/// Run `plan.total_runs()` times, pausing `plan.run_delay` after each run,
/// and return the samples after the first `plan.warmup_runs`.
pub fn collect_samples<R, P>(plan: &RunPlan, mut run: R, mut on_sample: P) -> Result<Vec<f64>>
where
    R: FnMut() -> Result<f64>,
    P: FnMut(&RunSample),
{
    let mut measured = Vec::with_capacity(plan.measured_runs);
    for index in 0..plan.total_runs() {
        let seconds = run()?;
        let sample = RunSample {
            index,
            seconds,
            warmup: index < plan.warmup_runs,
        };
        on_sample(&sample);
        if !sample.warmup {
            measured.push(seconds);
        }
        thread::sleep(plan.run_delay);
    }
    Ok(measured)
}

/// Time one variant of `target` and persist its trimmed samples.
pub fn measure_variant(
    target: &BenchmarkTarget,
    variant: Variant,
    invocation: &Invocation,
    plan: &RunPlan,
    dirs: &OutputDirs,
    progress: &mut ProgressFn<'_>,
) -> Result<SampleSet> {
    info!(bench = %target.name, %variant, runs = plan.total_runs(), "measuring");

    let measured = SampleSet {
        variant,
        samples: collect_samples(plan, || invocation.run_once(), |sample| {
            progress(target, variant, sample)
        })?,
    };
    results::write_sample_set(&measured, &dirs.results, &target.name)
}

/// Measure both variants of `target` and compare them. Archiving is left to
/// [`archive_measurement`] so the comparison can be shown first.
pub fn run_target(
    target: &BenchmarkTarget,
    env: &BTreeMap<String, String>,
    plan: &RunPlan,
    dirs: &OutputDirs,
    progress: &mut ProgressFn<'_>,
) -> Result<Measurement> {
    let normal_inv = Invocation::for_target(target, Variant::Normal, env);
    let modified_inv = Invocation::for_target(target, Variant::Modified, env);

    let normal = measure_variant(target, Variant::Normal, &normal_inv, plan, dirs, progress)?;

    debug!(delay = ?plan.phase_delay, "settling between phases");
    thread::sleep(plan.phase_delay);

    let modified = measure_variant(
        target,
        Variant::Modified,
        &modified_inv,
        plan,
        dirs,
        progress,
    )?;

    measurement(target, &normal_inv, &modified_inv, normal, modified, dirs)
}

/// Compare the result files already on disk, without running anything.
pub fn summarize_target(
    target: &BenchmarkTarget,
    env: &BTreeMap<String, String>,
    dirs: &OutputDirs,
) -> Result<Measurement> {
    let normal = results::read_sample_set(&dirs.results, &target.name, Variant::Normal)?;
    let modified = results::read_sample_set(&dirs.results, &target.name, Variant::Modified)?;

    measurement(
        target,
        &Invocation::for_target(target, Variant::Normal, env),
        &Invocation::for_target(target, Variant::Modified, env),
        normal,
        modified,
        dirs,
    )
}

pub fn compare(normal: &[f64], modified: &[f64]) -> Option<Comparison> {
    let normal_median = stats::median(normal)?;
    let modified_median = stats::median(modified)?;
    Some(Comparison {
        normal_median,
        modified_median,
        ratio: stats::ratio(modified_median, normal_median),
    })
}

fn measurement(
    target: &BenchmarkTarget,
    normal_inv: &Invocation,
    modified_inv: &Invocation,
    normal: SampleSet,
    modified: SampleSet,
    dirs: &OutputDirs,
) -> Result<Measurement> {
    let comparison = compare(&normal.samples, &modified.samples).ok_or_else(|| {
        BenchError::EmptySampleSet {
            path: dirs.results.clone(),
        }
    })?;
    info!(bench = %target.name, ratio = comparison.ratio, "compared");

    Ok(Measurement {
        target: target.name.clone(),
        normal,
        modified,
        comparison,
        normal_command: normal_inv.command_line(),
        modified_command: modified_inv.command_line(),
    })
}

/// Copy the result files into the logs dir under a fresh timestamp.
pub fn archive_measurement(measurement: Measurement, dirs: &OutputDirs) -> Result<TargetReport> {
    let stamp = results::timestamp(Local::now());
    let archived = results::archive(
        &dirs.results,
        &dirs.logs,
        &measurement.target,
        &stamp,
        &measurement.normal_command,
        &measurement.modified_command,
    )?;
    info!(bench = %measurement.target, %stamp, "archived");

    Ok(TargetReport {
        target: measurement.target,
        normal: measurement.normal.samples,
        modified: measurement.modified.samples,
        comparison: measurement.comparison,
        archived,
    })
}
