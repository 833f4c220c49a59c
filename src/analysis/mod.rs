// Analysis module - strum detection pipeline
//
// Pipeline: OnsetDetector (audio → onset times) → MotionClassifier
// (motion derivative sign at each onset → up/down).
// Output: StrumEstimate with one time sequence per direction.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AnalysisError;

pub mod motion;
pub mod onset;
pub mod spectrogram;

use motion::MotionClassifier;
use onset::OnsetDetector;

/// Direction of a strum gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrumDirection {
    /// Upstroke (motion derivative > 0)
    Up,
    /// Downstroke (motion derivative <= 0)
    Down,
}

impl StrumDirection {
    /// Parse a label code (`U` or `D`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(StrumDirection::Up),
            "D" => Some(StrumDirection::Down),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            StrumDirection::Up => 'U',
            StrumDirection::Down => 'D',
        }
    }
}

/// Estimated strum times, partitioned by direction
///
/// Each sequence keeps the order in which onsets were visited; the two
/// sequences are not merged or sorted against each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrumEstimate {
    pub up: Vec<f64>,
    pub down: Vec<f64>,
}

impl StrumEstimate {
    pub fn push(&mut self, direction: StrumDirection, time: f64) {
        match direction {
            StrumDirection::Up => self.up.push(time),
            StrumDirection::Down => self.down.push(time),
        }
    }

    pub fn times(&self, direction: StrumDirection) -> &[f64] {
        match direction {
            StrumDirection::Up => &self.up,
            StrumDirection::Down => &self.down,
        }
    }

    pub fn len(&self) -> usize {
        self.up.len() + self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All strums in global time order
    pub fn merged(&self) -> Vec<(f64, StrumDirection)> {
        let mut events: Vec<(f64, StrumDirection)> = self
            .up
            .iter()
            .map(|&t| (t, StrumDirection::Up))
            .chain(self.down.iter().map(|&t| (t, StrumDirection::Down)))
            .collect();
        events.sort_by(|a, b| a.0.total_cmp(&b.0));
        events
    }
}

/// Onset extraction plus motion-based direction classification
pub struct StrumDetector {
    onset_detector: OnsetDetector,
    motion_classifier: MotionClassifier,
}

impl StrumDetector {
    /// Create a detector for audio at `sample_rate`
    pub fn new(sample_rate: u32, config: &AppConfig) -> Self {
        Self {
            onset_detector: OnsetDetector::with_config(sample_rate, config.onset.clone()),
            motion_classifier: MotionClassifier::new(config.motion.clone()),
        }
    }

    pub fn onset_detector(&self) -> &OnsetDetector {
        &self.onset_detector
    }

    /// Detect strums without validating the inputs
    pub fn detect(
        &self,
        waveform: &[f32],
        motion_values: &[f64],
        motion_timestamps: &[f64],
    ) -> StrumEstimate {
        let onsets = self.onset_detector.detect(waveform);
        let estimate = self
            .motion_classifier
            .classify(motion_values, motion_timestamps, &onsets);

        tracing::debug!(
            "[StrumDetector] {} onsets → {} up, {} down",
            onsets.len(),
            estimate.up.len(),
            estimate.down.len()
        );

        estimate
    }
}

/// Classify the strums of one example
///
/// `motion_values` should already be normalized by the caller; only the sign
/// of the derivative matters, so scaling does not change the result.
pub fn classify_example(
    waveform: &[f32],
    sample_rate: u32,
    motion_values: &[f64],
    motion_timestamps: &[f64],
    config: &AppConfig,
) -> Result<StrumEstimate, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate { sample_rate });
    }
    if waveform.is_empty() {
        return Err(AnalysisError::EmptyWaveform);
    }
    if motion_timestamps.is_empty() {
        return Err(AnalysisError::EmptyMotion);
    }
    if motion_values.len() != motion_timestamps.len() {
        return Err(AnalysisError::MotionLengthMismatch {
            values: motion_values.len(),
            timestamps: motion_timestamps.len(),
        });
    }

    Ok(StrumDetector::new(sample_rate, config).detect(waveform, motion_values, motion_timestamps))
}

#[cfg(test)]
mod tests;
