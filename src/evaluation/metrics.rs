//! Fixed-field metric records and their corpus-level average.

use serde::{Deserialize, Serialize};

use crate::evaluation::matching::DetectionScores;

/// Per-example scores for both strum directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub down_precision: f64,
    pub down_recall: f64,
    pub down_f_measure: f64,
    pub up_precision: f64,
    pub up_recall: f64,
    pub up_f_measure: f64,
}

impl MetricRecord {
    pub fn from_scores(down: DetectionScores, up: DetectionScores) -> Self {
        Self {
            down_precision: down.precision,
            down_recall: down.recall,
            down_f_measure: down.f_measure,
            up_precision: up.precision,
            up_recall: up.recall,
            up_f_measure: up.f_measure,
        }
    }

    pub fn down(&self) -> DetectionScores {
        DetectionScores {
            precision: self.down_precision,
            recall: self.down_recall,
            f_measure: self.down_f_measure,
        }
    }

    pub fn up(&self) -> DetectionScores {
        DetectionScores {
            precision: self.up_precision,
            recall: self.up_recall,
            f_measure: self.up_f_measure,
        }
    }

    fn map2(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            down_precision: op(self.down_precision, other.down_precision),
            down_recall: op(self.down_recall, other.down_recall),
            down_f_measure: op(self.down_f_measure, other.down_f_measure),
            up_precision: op(self.up_precision, other.up_precision),
            up_recall: op(self.up_recall, other.up_recall),
            up_f_measure: op(self.up_f_measure, other.up_f_measure),
        }
    }

    /// Field-wise sum
    pub fn plus(&self, other: &Self) -> Self {
        self.map2(other, |a, b| a + b)
    }

    /// Every field divided by `divisor`
    pub fn divided_by(&self, divisor: f64) -> Self {
        self.map2(self, |a, _| a / divisor)
    }
}

/// Running sum of metric records
///
/// Partial accumulators can be built independently and combined with
/// [`MetricAccumulator::merge`]; the result does not depend on grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricAccumulator {
    sum: MetricRecord,
    count: usize,
}

impl MetricAccumulator {
    pub fn add(mut self, record: &MetricRecord) -> Self {
        self.sum = self.sum.plus(record);
        self.count += 1;
        self
    }

    pub fn merge(a: Self, b: Self) -> Self {
        Self {
            sum: a.sum.plus(&b.sum),
            count: a.count + b.count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean of all added records, `None` if nothing was added
    pub fn finalize(&self) -> Option<MetricRecord> {
        (self.count > 0).then(|| self.sum.divided_by(self.count as f64))
    }
}

impl<'a> FromIterator<&'a MetricRecord> for MetricAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a MetricRecord>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MetricAccumulator::default(), |acc, record| acc.add(record))
    }
}
