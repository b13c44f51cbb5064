use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::debug;

use crate::errors::BenchError;
use crate::stats;
use crate::types::{ArchivedFiles, SampleSet, Variant};

/// `%y_%m_%d_%H_%M_%S`, e.g. `26_10_19_14_03_59`.
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%y_%m_%d_%H_%M_%S").to_string()
}

pub fn results_path(results_dir: &Path, target: &str, variant: Variant) -> PathBuf {
    results_dir.join(format!("results_{}_{}.txt", target, variant))
}

pub fn archive_path(logs_dir: &Path, target: &str, variant: Variant, stamp: &str) -> PathBuf {
    logs_dir.join(format!("results_{}_{}{}.txt", target, variant, stamp))
}

pub fn info_path(logs_dir: &Path, target: &str, stamp: &str) -> PathBuf {
    logs_dir.join(format!("results_info_{}_{}.txt", target, stamp))
}

/// Output directories are never created here; a missing one is an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(BenchError::DirectoryNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Trim `samples`, write the survivors one per line to `path` and return them.
///
/// The file is flushed and closed before returning, so a later failure in the
/// session cannot leave it half-written.
pub fn write_trimmed(samples: &[f64], path: &Path) -> Result<Vec<f64>> {
    let trimmed = stats::trim(samples);
    if trimmed.is_empty() {
        return Err(BenchError::EmptySampleSet {
            path: path.to_path_buf(),
        }
        .into());
    }

    let write_err = |source| BenchError::ResultWriteError {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    for sample in &trimmed {
        writeln!(out, "{:?}", sample).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;

    debug!(path = %path.display(), samples = trimmed.len(), "wrote results");
    Ok(trimmed)
}

/// Trim a measured set and persist it to the results file its variant maps to.
pub fn write_sample_set(set: &SampleSet, results_dir: &Path, target: &str) -> Result<SampleSet> {
    let path = results_path(results_dir, target, set.variant);
    Ok(SampleSet {
        variant: set.variant,
        samples: write_trimmed(&set.samples, &path)?,
    })
}

pub fn read_sample_set(results_dir: &Path, target: &str, variant: Variant) -> Result<SampleSet> {
    let path = results_path(results_dir, target, variant);
    Ok(SampleSet {
        variant,
        samples: read_samples(&path)?,
    })
}

/// Read a results file back. Blank lines are skipped; every other line must
/// hold a finite, non-negative duration.
pub fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let raw = fs::read_to_string(path).map_err(|source| BenchError::ResultReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut samples = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || BenchError::ResultParseError {
            path: path.to_path_buf(),
            line: i + 1,
            value: line.to_string(),
        };
        let value: f64 = line.parse().map_err(|_| malformed())?;
        if !value.is_finite() || value < 0.0 {
            return Err(malformed().into());
        }
        samples.push(value);
    }

    if samples.is_empty() {
        return Err(BenchError::EmptySampleSet {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(samples)
}

pub fn format_info(normal_command: &str, modified_command: &str) -> String {
    format!(
        "NORMAL PROGRAM = {}\nMODIFIED PROGRAM = {}\n",
        normal_command, modified_command
    )
}

/// Copy both result files into `logs_dir` under `stamp` and record the two
/// command lines next to them.
pub fn archive(
    results_dir: &Path,
    logs_dir: &Path,
    target: &str,
    stamp: &str,
    normal_command: &str,
    modified_command: &str,
) -> Result<ArchivedFiles> {
    let copy = |variant: Variant| -> Result<PathBuf> {
        let from = results_path(results_dir, target, variant);
        let to = archive_path(logs_dir, target, variant, stamp);
        fs::copy(&from, &to).map_err(|source| BenchError::ArchiveError {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        debug!(from = %from.display(), to = %to.display(), "archived results");
        Ok(to)
    };

    let normal = copy(Variant::Normal)?;
    let modified = copy(Variant::Modified)?;

    let info = info_path(logs_dir, target, stamp);
    fs::write(&info, format_info(normal_command, modified_command)).map_err(|source| {
        BenchError::ResultWriteError {
            path: info.clone(),
            source,
        }
    })?;

    Ok(ArchivedFiles {
        normal,
        modified,
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_underscore_joined_two_digit_fields() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(timestamp(at), "26_03_07_09_05_02");
    }

    #[test]
    fn file_names_follow_layout() {
        let dir = Path::new("out");
        assert_eq!(
            results_path(dir, "cholesky", Variant::Normal),
            Path::new("out/results_cholesky_normal.txt")
        );
        assert_eq!(
            archive_path(dir, "cholesky", Variant::Modified, "26_01_01_00_00_00"),
            Path::new("out/results_cholesky_modified26_01_01_00_00_00.txt")
        );
        assert_eq!(
            info_path(dir, "cholesky", "26_01_01_00_00_00"),
            Path::new("out/results_info_cholesky_26_01_01_00_00_00.txt")
        );
    }

    #[test]
    fn write_trimmed_persists_interior_samples() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("results_x_normal.txt");

        let kept = write_trimmed(&[0.5, 0.1, 0.4, 0.9, 0.2], &path).unwrap();
        assert_eq!(kept, vec![0.2, 0.4, 0.5]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.2\n0.4\n0.5\n");
    }

    #[test]
    fn write_trimmed_whole_seconds_keep_decimal_point() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");

        write_trimmed(&[1.0, 2.0, 3.0], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2.0\n");
    }

    #[test]
    fn write_trimmed_rejects_too_few_samples() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");

        assert!(write_trimmed(&[1.0, 2.0], &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn write_into_missing_dir_errors() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("r.txt");

        let err = write_trimmed(&[1.0, 2.0, 3.0], &path).unwrap_err();
        assert!(err.to_string().contains("Failed to write results"));
    }

    #[test]
    fn read_samples_reads_what_was_written() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        fs::write(&path, "0.25\n\n1.5\n3e-7\n").unwrap();

        assert_eq!(read_samples(&path).unwrap(), vec![0.25, 1.5, 3e-7]);
    }

    #[test]
    fn read_samples_reports_bad_line() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        fs::write(&path, "0.25\nfast\n").unwrap();

        let err = read_samples(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn read_samples_rejects_non_durations() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");

        for bad in ["NaN", "inf", "-inf", "-1.0"] {
            fs::write(&path, format!("0.5\n{}\n", bad)).unwrap();
            let err = read_samples(&path).unwrap_err();
            assert!(err.to_string().contains("line 2"), "{} should be rejected", bad);
        }
    }

    #[test]
    fn read_samples_accepts_zero() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        fs::write(&path, "0.0\n").unwrap();

        assert_eq!(read_samples(&path).unwrap(), vec![0.0]);
    }

    #[test]
    fn sample_set_round_trips_through_variant_file() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let measured = SampleSet {
            variant: Variant::Modified,
            samples: vec![0.4, 0.1, 0.3, 0.9],
        };

        let trimmed = write_sample_set(&measured, tmp.path(), "fib").unwrap();
        assert_eq!(trimmed.variant, Variant::Modified);
        assert_eq!(trimmed.samples, vec![0.3, 0.4]);
        assert!(tmp.path().join("results_fib_modified.txt").is_file());
        assert!(!tmp.path().join("results_fib_normal.txt").exists());

        let read = read_sample_set(tmp.path(), "fib", Variant::Modified).unwrap();
        assert_eq!(read, trimmed);
    }

    #[test]
    fn read_samples_empty_file_errors() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        fs::write(&path, "\n").unwrap();

        assert!(read_samples(&path).is_err());
    }

    #[test]
    fn ensure_dir_rejects_missing() {
        let tmp = assert_fs::TempDir::new().unwrap();
        assert!(ensure_dir(tmp.path()).is_ok());

        let err = ensure_dir(&tmp.path().join("logs")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn archive_copies_results_and_writes_info() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let results = tmp.path().join("results");
        let logs = tmp.path().join("logs");
        fs::create_dir_all(&results).unwrap();
        fs::create_dir_all(&logs).unwrap();
        fs::write(results_path(&results, "fib", Variant::Normal), "1.0\n").unwrap();
        fs::write(results_path(&results, "fib", Variant::Modified), "2.0\n").unwrap();

        let files = archive(
            &results,
            &logs,
            "fib",
            "26_10_19_12_00_00",
            "/b/normal_fib 30",
            "/b/fib 30",
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&files.normal).unwrap(), "1.0\n");
        assert_eq!(fs::read_to_string(&files.modified).unwrap(), "2.0\n");
        assert_eq!(
            fs::read_to_string(&files.info).unwrap(),
            "NORMAL PROGRAM = /b/normal_fib 30\nMODIFIED PROGRAM = /b/fib 30\n"
        );
        assert_eq!(
            files.info.file_name().unwrap(),
            "results_info_fib_26_10_19_12_00_00.txt"
        );
    }

    #[test]
    fn archive_without_results_errors() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let err = archive(tmp.path(), tmp.path(), "fib", "s", "a", "b").unwrap_err();
        assert!(err.to_string().contains("Failed to archive"));
    }
}
