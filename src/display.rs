use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use crate::config::RunPlan;
use crate::types::{ArchivedFiles, Comparison, RunSample, TargetReport, Variant};

pub fn format_banner(plan: &RunPlan) -> String {
    format!(
        "Running benchmarks {} times after discarding {} runs",
        plan.measured_runs, plan.warmup_runs
    )
}

/// One line per timed run: `[cholesky] Run (normal) 3 completed: 1.52`.
pub fn format_progress(
    target: &str,
    variant: Variant,
    sample: &RunSample,
    stream: Stream,
) -> String {
    let line = format!(
        "[{}] Run ({}) {} completed: {:?}",
        target, variant, sample.index, sample.seconds
    );
    if sample.warmup {
        let tag = "(warmup)"
            .if_supports_color(stream, |s| s.dimmed())
            .to_string();
        format!("{} {}", line, tag)
    } else {
        line
    }
}

/// Medians and the modified/normal ratio; the ratio line is red.
pub fn format_comparison(cmp: &Comparison, stream: Stream) -> String {
    let ratio_line = format!("Ratio modified/normal: {:?}", cmp.ratio);

    let mut out = String::new();
    out.push_str(&format!("Normal median: {:?}\n", cmp.normal_median));
    out.push_str(&format!("Modified median: {:?}\n", cmp.modified_median));
    out.push_str(&ratio_line.if_supports_color(stream, |s| s.red()).to_string());
    out.push('\n');
    out
}

pub fn format_archived(archived: &ArchivedFiles, stream: Stream) -> String {
    let line = format!("Archived: {}", archived.info.display());
    format!("{}\n", line.if_supports_color(stream, |s| s.dimmed()))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    normal_median: f64,
    modified_median: f64,
    ratio: f64,
    normal_samples: &'a [f64],
    modified_samples: &'a [f64],
    archived: &'a ArchivedFiles,
}

pub fn format_json(reports: &[TargetReport]) -> String {
    let json: Vec<JsonReport<'_>> = reports
        .iter()
        .map(|r| JsonReport {
            target: &r.target,
            normal_median: r.comparison.normal_median,
            modified_median: r.comparison.modified_median,
            ratio: r.comparison.ratio,
            normal_samples: &r.normal,
            modified_samples: &r.modified,
            archived: &r.archived,
        })
        .collect();

    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn report() -> TargetReport {
        TargetReport {
            target: "cholesky".to_string(),
            normal: vec![1.0, 2.0, 3.0],
            modified: vec![2.0, 3.0, 4.0],
            comparison: Comparison {
                normal_median: 2.0,
                modified_median: 3.0,
                ratio: 1.5,
            },
            archived: ArchivedFiles {
                normal: PathBuf::from("logs/results_cholesky_normal26_01_01_00_00_00.txt"),
                modified: PathBuf::from("logs/results_cholesky_modified26_01_01_00_00_00.txt"),
                info: PathBuf::from("logs/results_info_cholesky_26_01_01_00_00_00.txt"),
            },
        }
    }

    // Colors are disabled when stdout is not a terminal, which holds under `cargo test`.

    #[test]
    fn banner_reports_measured_and_discarded() {
        let plan = RunPlan::new(6, 1, Duration::ZERO, Duration::ZERO).unwrap();
        assert_eq!(
            format_banner(&plan),
            "Running benchmarks 6 times after discarding 1 runs"
        );
    }

    #[test]
    fn progress_line_for_measured_run() {
        let sample = RunSample {
            index: 3,
            seconds: 1.25,
            warmup: false,
        };
        assert_eq!(
            format_progress("cholesky", Variant::Normal, &sample, Stream::Stdout),
            "[cholesky] Run (normal) 3 completed: 1.25"
        );
    }

    #[test]
    fn progress_line_marks_warmup() {
        let sample = RunSample {
            index: 0,
            seconds: 2.0,
            warmup: true,
        };
        let line = format_progress("fib", Variant::Modified, &sample, Stream::Stdout);
        assert!(line.starts_with("[fib] Run (modified) 0 completed: 2.0"));
        assert!(line.contains("(warmup)"));
    }

    #[test]
    fn comparison_lists_medians_and_ratio() {
        let out = format_comparison(&report().comparison, Stream::Stdout);
        assert!(out.starts_with("Normal median: 2.0\nModified median: 3.0\n"));
        assert!(out.contains("Ratio modified/normal: 1.5"));
        assert!(!out.contains("Archived"));
    }

    #[test]
    fn archived_line_names_info_file() {
        let out = format_archived(&report().archived, Stream::Stdout);
        assert!(out.starts_with("Archived: "));
        assert!(out.contains("results_info_cholesky_26_01_01_00_00_00.txt"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn json_has_one_entry_per_report() {
        let parsed: serde_json::Value = serde_json::from_str(&format_json(&[report()])).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["target"], "cholesky");
        assert_eq!(arr[0]["ratio"], 1.5);
        assert_eq!(arr[0]["normal_samples"].as_array().unwrap().len(), 3);
        assert!(arr[0]["archived"]["info"].is_string());
    }

    #[test]
    fn json_empty_is_empty_array() {
        assert_eq!(format_json(&[]), "[]");
    }
}
