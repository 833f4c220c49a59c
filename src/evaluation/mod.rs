//! Evaluation harness: scores estimated strums against reference labels
//! for a single example or a whole dataset directory.
//!
//! Examples are independent, so the corpus is evaluated in parallel with
//! rayon. Results are always reported in catalog order.

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{classify_example, StrumDirection, StrumEstimate};
use crate::config::AppConfig;
use crate::dataset::loaders::reference_times;
use crate::dataset::{DatasetCatalog, ExampleFiles, LoadedExample};
use crate::error::{log_analysis_error, log_dataset_error, DatasetError};

pub mod matching;
pub mod metrics;
pub mod report;

pub use matching::{score_events, DetectionScores};
pub use metrics::{MetricAccumulator, MetricRecord};

/// Result of evaluating one example
#[derive(Debug, Clone, Serialize)]
pub struct ExampleReport {
    pub id: String,
    /// File name of the example's label file
    pub name: String,
    pub estimate: StrumEstimate,
    pub metrics: MetricRecord,
}

/// Example that failed while loading or analysing
#[derive(Debug, Clone, Serialize)]
pub struct FailedExample {
    pub id: String,
    pub error: String,
}

/// Result of evaluating a dataset directory
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub examples: Vec<ExampleReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedExample>,
    pub average: Option<MetricRecord>,
}

/// Score an estimate against reference labels for both directions
pub fn score_estimate(
    estimate: &StrumEstimate,
    labels: &[crate::dataset::StrumLabel],
    window: f64,
) -> MetricRecord {
    let score = |direction| {
        score_events(
            &reference_times(labels, direction),
            estimate.times(direction),
            window,
        )
    };
    MetricRecord::from_scores(score(StrumDirection::Down), score(StrumDirection::Up))
}

/// Classify and score an already loaded example
pub fn evaluate_example(
    example: &LoadedExample,
    config: &AppConfig,
) -> Result<ExampleReport, DatasetError> {
    let estimate = classify_example(
        &example.waveform.samples,
        example.waveform.sample_rate,
        &example.motion.values,
        &example.motion.timestamps,
        config,
    )
    .map_err(|source| {
        log_analysis_error(&source, &example.files.id);
        DatasetError::Analysis {
            example: example.files.id.clone(),
            source,
        }
    })?;

    let metrics = score_estimate(&estimate, &example.labels, config.evaluation.tolerance_window);

    Ok(ExampleReport {
        id: example.files.id.clone(),
        name: example.files.labels_file_name(),
        estimate,
        metrics,
    })
}

/// Load, classify and score one example from disk
pub fn evaluate_files(
    files: &ExampleFiles,
    config: &AppConfig,
) -> Result<ExampleReport, DatasetError> {
    let example = LoadedExample::load(files, &config.audio)?;
    let report = evaluate_example(&example, config)?;

    tracing::info!(
        "[Evaluation] {}: down F={:.3}, up F={:.3}",
        report.id,
        report.metrics.down_f_measure,
        report.metrics.up_f_measure
    );

    Ok(report)
}

/// Evaluate every example of a dataset
///
/// By default the first failing example (in catalog order) aborts the run.
/// With `evaluation.continue_on_error` failures are logged and listed in the
/// report instead, and the average covers the remaining examples.
pub fn evaluate_corpus(
    catalog: &DatasetCatalog,
    config: &AppConfig,
) -> Result<CorpusReport, DatasetError> {
    evaluate_corpus_with(catalog, config, |_| {})
}

/// Like [`evaluate_corpus`], calling `on_report` for each successful example
/// in catalog order
///
/// In fail-fast mode `on_report` sees every example that precedes the first
/// failure before the error is returned.
pub fn evaluate_corpus_with<F>(
    catalog: &DatasetCatalog,
    config: &AppConfig,
    mut on_report: F,
) -> Result<CorpusReport, DatasetError>
where
    F: FnMut(&ExampleReport),
{
    let examples = catalog.discover()?;
    if examples.is_empty() {
        return Err(DatasetError::EmptyCorpus {
            dir: catalog.root().to_path_buf(),
        });
    }

    tracing::info!(
        "[Evaluation] Evaluating {} examples from {}",
        examples.len(),
        catalog.root().display()
    );

    let outcomes: Vec<Result<ExampleReport, DatasetError>> = examples
        .par_iter()
        .map(|files| evaluate_files(files, config))
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (files, outcome) in examples.iter().zip(outcomes) {
        match outcome {
            Ok(report) => {
                on_report(&report);
                reports.push(report);
            }
            Err(err) if config.evaluation.continue_on_error => {
                log_dataset_error(&err, &files.id);
                failures.push(FailedExample {
                    id: files.id.clone(),
                    error: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let accumulator = reports
        .par_iter()
        .fold(MetricAccumulator::default, |acc, report| acc.add(&report.metrics))
        .reduce(MetricAccumulator::default, MetricAccumulator::merge);

    Ok(CorpusReport {
        examples: reports,
        failures,
        average: accumulator.finalize(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StrumLabel;

    fn label(time: f64, code: &str) -> StrumLabel {
        StrumLabel {
            time,
            code: code.to_string(),
            chord: Some("C".to_string()),
        }
    }

    #[test]
    fn test_score_estimate_splits_by_direction() {
        let labels = vec![
            label(0.5, "D"),
            label(1.0, "U"),
            label(1.5, "D"),
            label(2.0, "U"),
        ];
        let estimate = StrumEstimate {
            up: vec![1.02, 1.49],
            down: vec![0.51, 2.0],
        };

        let metrics = score_estimate(&estimate, &labels, 0.1);

        assert_eq!(metrics.down_precision, 0.5);
        assert_eq!(metrics.down_recall, 0.5);
        assert_eq!(metrics.up_precision, 0.5);
        assert_eq!(metrics.up_recall, 0.5);
    }

    #[test]
    fn test_analysis_failure_is_wrapped_with_example_id() {
        let example = LoadedExample {
            files: ExampleFiles::resolve(std::path::Path::new("dataset"), "take_07"),
            waveform: crate::dataset::Waveform {
                samples: vec![0.0; 1_024],
                sample_rate: 22_050,
            },
            motion: crate::dataset::MotionSignal::default(),
            labels: vec![label(0.5, "D")],
        };

        let err = evaluate_example(&example, &AppConfig::default()).unwrap_err();

        match err {
            DatasetError::Analysis { example, source } => {
                assert_eq!(example, "take_07");
                assert_eq!(source, crate::error::AnalysisError::EmptyMotion);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_score_estimate_ignores_unknown_codes() {
        let labels = vec![label(0.5, "D"), label(1.0, "X")];
        let estimate = StrumEstimate {
            up: vec![],
            down: vec![0.5],
        };

        let metrics = score_estimate(&estimate, &labels, 0.1);

        assert_eq!(metrics.down_f_measure, 1.0);
        assert_eq!(metrics.up_f_measure, 0.0);
    }
}
