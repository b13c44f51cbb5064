use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A named pair of executables sharing a directory and an argument list.
///
/// The baseline lives at `<dir>/normal_<name>`, the candidate at `<dir>/<name>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkTarget {
    pub name: String,
    pub dir: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl BenchmarkTarget {
    pub fn executable(&self, variant: Variant) -> PathBuf {
        match variant {
            Variant::Normal => self.dir.join(format!("normal_{}", self.name)),
            Variant::Modified => self.dir.join(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Normal,
    Modified,
}

impl Variant {
    /// Run order within a target.
    pub const ALL: [Variant; 2] = [Variant::Normal, Variant::Modified];

    pub fn label(self) -> &'static str {
        match self {
            Variant::Normal => "normal",
            Variant::Modified => "modified",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSample {
    pub index: usize,
    pub seconds: f64,
    pub warmup: bool,
}

/// Samples for one variant. Measured sets are in run order; once trimmed
/// they are sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub variant: Variant,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub normal_median: f64,
    pub modified_median: f64,
    pub ratio: f64,
}

/// Files produced for one target.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedFiles {
    pub normal: PathBuf,
    pub modified: PathBuf,
    pub info: PathBuf,
}

/// Both trimmed sets of a target and how they compare, not yet archived.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub target: String,
    pub normal: SampleSet,
    pub modified: SampleSet,
    pub comparison: Comparison,
    pub normal_command: String,
    pub modified_command: String,
}

/// Everything the summary needs about one finished target.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: String,
    pub normal: Vec<f64>,
    pub modified: Vec<f64>,
    pub comparison: Comparison,
    pub archived: ArchivedFiles,
}
