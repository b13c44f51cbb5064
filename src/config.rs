use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::errors::BenchError;
use crate::types::BenchmarkTarget;

pub const DEFAULT_MEASURED_RUNS: usize = 6;
pub const DEFAULT_WARMUP_RUNS: usize = 1;
pub const DEFAULT_RUN_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_PHASE_DELAY_SECS: f64 = 5.0;

/// Targets to benchmark plus the environment handed to every child.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, rename = "target")]
    pub targets: Vec<BenchmarkTarget>,
}

impl TargetConfig {
    /// Cilk `cholesky` with a single worker and the MHWM hooks switched off.
    pub fn builtin() -> Self {
        let env = [
            ("CILK_NWORKERS", "1"),
            ("MHWM_FullSPDAG", "0"),
            ("MHWM_Source", "0"),
            ("MHWM_NumProcessors", "32"),
            ("MHWM_OutputDAG", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        TargetConfig {
            env,
            targets: vec![BenchmarkTarget {
                name: "cholesky".to_string(),
                dir: PathBuf::from("/efs/home/vettorel/cilkbench/cilk5"),
                args: ["-n", "2000", "-z", "4000"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }],
        }
    }

    /// Targets whose names appear in `names`, in configuration order.
    /// An empty filter selects everything.
    pub fn select(&self, names: &[String]) -> Result<Vec<BenchmarkTarget>> {
        if names.is_empty() {
            return Ok(self.targets.clone());
        }

        for name in names {
            if !self.targets.iter().any(|t| &t.name == name) {
                let known = self
                    .targets
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(BenchError::UnknownTarget {
                    name: name.clone(),
                    known,
                }
                .into());
            }
        }

        Ok(self
            .targets
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }
}

pub fn load_file(path: &Path) -> Result<TargetConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let config: TargetConfig =
        toml::from_str(&raw).map_err(|e| BenchError::ConfigParseError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(config)
}

/// `<config_dir>/benchpair/targets.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("benchpair").join("targets.toml"))
}

/// Explicit path, else the per-user file, else the built-in targets.
pub fn resolve(explicit: Option<&Path>) -> Result<TargetConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading target config");
        return load_file(path);
    }

    if let Some(path) = user_config_path()
        && path.is_file()
    {
        debug!(path = %path.display(), "loading user target config");
        return load_file(&path);
    }

    debug!("using built-in targets");
    Ok(TargetConfig::builtin())
}

/// How many times to run each variant and how long to pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPlan {
    pub measured_runs: usize,
    pub warmup_runs: usize,
    pub run_delay: Duration,
    pub phase_delay: Duration,
}

impl RunPlan {
    pub fn new(
        measured_runs: usize,
        warmup_runs: usize,
        run_delay: Duration,
        phase_delay: Duration,
    ) -> Result<Self> {
        if measured_runs < 3 {
            return Err(BenchError::NotEnoughRuns {
                measured: measured_runs,
            }
            .into());
        }
        if measured_runs.checked_add(warmup_runs).is_none() {
            return Err(BenchError::TooManyRuns {
                measured: measured_runs,
                warmup: warmup_runs,
            }
            .into());
        }
        Ok(RunPlan {
            measured_runs,
            warmup_runs,
            run_delay,
            phase_delay,
        })
    }

    /// Cannot overflow: `new` rejects plans whose sum does not fit.
    pub fn total_runs(&self) -> usize {
        self.measured_runs + self.warmup_runs
    }
}

impl Default for RunPlan {
    fn default() -> Self {
        RunPlan {
            measured_runs: DEFAULT_MEASURED_RUNS,
            warmup_runs: DEFAULT_WARMUP_RUNS,
            run_delay: Duration::from_secs_f64(DEFAULT_RUN_DELAY_SECS),
            phase_delay: Duration::from_secs_f64(DEFAULT_PHASE_DELAY_SECS),
        }
    }
}
