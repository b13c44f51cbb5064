use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Benchmark executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    #[error("Failed to start {path}: {source}")]
    SpawnFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} exited with {status}")]
    NonZeroExit { path: PathBuf, status: ExitStatus },

    #[error("Directory {path} does not exist. Create it before running benchmarks")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to write results to {path}: {source}")]
    ResultWriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read results from {path}: {source}")]
    ResultReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed sample on line {line} of {path}: {value:?}")]
    ResultParseError {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Failed to archive {from} to {to}: {source}")]
    ArchiveError {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParseError { path: PathBuf, detail: String },

    #[error("Unknown target '{name}'. Configured: {known}")]
    UnknownTarget { name: String, known: String },

    #[error("At least 3 measured runs are needed to trim outliers, got {measured}")]
    NotEnoughRuns { measured: usize },

    #[error("{measured} measured plus {warmup} warmup runs is more than can be counted")]
    TooManyRuns { measured: usize, warmup: usize },

    #[error("No samples left in {path} after trimming")]
    EmptySampleSet { path: PathBuf },
}
