//! Console and JSON rendering of evaluation results.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::DatasetError;
use crate::evaluation::{CorpusReport, DetectionScores, ExampleReport, MetricRecord};

/// Format a ratio as a percentage with two decimals (0.5 → "50.00%")
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// One `[Label] Precision: …, Recall: …, F-Measure: …` line
pub fn scores_line(label: &str, scores: &DetectionScores) -> String {
    format!(
        "[{}] Precision: {}, Recall: {}, F-Measure: {}",
        label,
        percent(scores.precision),
        percent(scores.recall),
        percent(scores.f_measure)
    )
}

fn metric_lines(out: &mut String, metrics: &MetricRecord) {
    let _ = writeln!(out, "{}", scores_line("Downstroke", &metrics.down()));
    let _ = writeln!(out, "{}", scores_line("Upstroke", &metrics.up()));
}

/// Per-example block, followed by a blank line
pub fn format_example(report: &ExampleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### Name={} ###", report.name);
    metric_lines(&mut out, &report.metrics);
    out.push('\n');
    out
}

/// Final average block
pub fn format_average(average: Option<&MetricRecord>) -> String {
    let mut out = String::from("### Average Results ###\n");
    match average {
        Some(metrics) => metric_lines(&mut out, metrics),
        None => out.push_str("No examples evaluated\n"),
    }
    out
}

/// Skipped examples followed by the average block
pub fn format_summary(report: &CorpusReport) -> String {
    let mut out = String::new();
    for failure in &report.failures {
        let _ = writeln!(out, "### Skipped={} ### {}\n", failure.id, failure.error);
    }
    out.push_str(&format_average(report.average.as_ref()));
    out
}

/// Full console report: every example in order, then the summary
pub fn format_corpus(report: &CorpusReport) -> String {
    let mut out: String = report.examples.iter().map(format_example).collect();
    out.push_str(&format_summary(report));
    out
}

/// Write the report as pretty-printed JSON
pub fn write_json(report: &CorpusReport, path: &Path) -> Result<(), DatasetError> {
    let json = serde_json::to_string_pretty(report).map_err(|err| DatasetError::Io {
        path: path.to_path_buf(),
        source: err.into(),
    })?;
    fs::write(path, json).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
