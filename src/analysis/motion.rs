// Motion - smoothing, differentiation and strum direction classification
//
// The motion trace is smoothed with a uniform moving average ("same"-size
// convolution with zero padding), differentiated with central differences
// and scaled. Each onset is labelled by the sign of the derivative at the
// motion sample nearest in time: strictly positive is an upstroke, anything
// else a downstroke.

use crate::analysis::{StrumDirection, StrumEstimate};
use crate::config::MotionConfig;

/// Uniform moving average with "same"-size output
///
/// The output has `max(values.len(), kernel_size)` samples and is centered
/// on the full convolution; samples outside the input count as zero.
pub fn smooth(values: &[f64], kernel_size: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let k = kernel_size.max(1);

    let shortest = n.min(k);
    let start = shortest - 1 - shortest / 2;
    let out_len = n.max(k);

    (0..out_len)
        .map(|i| {
            // Full-convolution index j covers inputs j-(k-1) ..= j
            let j = i + start;
            let first = j.saturating_sub(k - 1);
            let last = j.min(n - 1);
            let sum: f64 = if first <= last {
                values[first..=last].iter().sum()
            } else {
                0.0
            };
            sum / k as f64
        })
        .collect()
}

/// Discrete derivative: central differences inside, one-sided at the ends
pub fn gradient(values: &[f64]) -> Vec<f64> {
    match values.len() {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Index of the timestamp closest to `t`
///
/// `timestamps` must be sorted ascending. On equal distance the lower index
/// wins. Returns `None` for an empty slice.
pub fn nearest_index(timestamps: &[f64], t: f64) -> Option<usize> {
    if timestamps.is_empty() {
        return None;
    }

    let upper = timestamps.partition_point(|&ts| ts < t);
    if upper == 0 {
        return Some(0);
    }
    if upper == timestamps.len() {
        return Some(upper - 1);
    }

    let below = upper - 1;
    if (t - timestamps[below]).abs() <= (timestamps[upper] - t).abs() {
        Some(below)
    } else {
        Some(upper)
    }
}

/// Classifies onsets into up/down strums from a motion trace
pub struct MotionClassifier {
    config: MotionConfig,
}

impl MotionClassifier {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    /// Smoothed and scaled derivative of the motion signal
    pub fn derivative(&self, values: &[f64]) -> Vec<f64> {
        let scale = self.config.gradient_scale as f64;
        gradient(&smooth(values, self.config.kernel_size))
            .into_iter()
            .map(|d| d * scale)
            .collect()
    }

    /// Direction of a single onset given a precomputed derivative
    pub fn direction_at(derivative: &[f64], timestamps: &[f64], onset: f64) -> StrumDirection {
        let value = nearest_index(timestamps, onset)
            .and_then(|idx| derivative.get(idx))
            .copied()
            .unwrap_or(0.0);
        if value > 0.0 {
            StrumDirection::Up
        } else {
            StrumDirection::Down
        }
    }

    /// Split onsets into up and down strums
    ///
    /// Every onset lands in exactly one of the two sequences, each keeping
    /// the onset order. With no motion samples every onset is a downstroke.
    pub fn classify(&self, values: &[f64], timestamps: &[f64], onsets: &[f64]) -> StrumEstimate {
        let derivative = self.derivative(values);
        let mut estimate = StrumEstimate::default();

        for &onset in onsets {
            let direction = Self::direction_at(&derivative, timestamps, onset);
            estimate.push(direction, onset);
        }

        estimate
    }
}

impl Default for MotionClassifier {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
