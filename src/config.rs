//! Configuration management for the strum detector and evaluation harness
//!
//! Parameters for onset detection, motion analysis, audio loading and
//! evaluation are read from a JSON file so the baseline can be re-tuned
//! without recompilation. Every field has a default that reproduces the
//! reference baseline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::DatasetError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub onset: OnsetDetectionConfig,
    pub motion: MotionConfig,
    pub audio: AudioConfig,
    pub evaluation: EvaluationConfig,
}

/// Onset detection algorithm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetDetectionConfig {
    /// FFT window size in samples
    pub n_fft: usize,
    /// Hop size between analysis frames
    pub hop_size: usize,
    /// Number of mel bands the power spectrum is folded into
    pub n_mels: usize,
    /// Frame lag for the spectral difference
    pub lag: usize,
    /// Dynamic range (dB) kept below the loudest mel bin
    pub top_db: f32,
    /// Threshold added to the local mean during peak picking
    pub delta: f32,
    /// Candidates closer than this (seconds) to the previous candidate are pruned
    pub min_onset_gap: f64,
}

impl Default for OnsetDetectionConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_size: 512,
            n_mels: 128,
            lag: 1,
            top_db: 80.0,
            delta: 0.07,
            min_onset_gap: 0.15,
        }
    }
}

/// Motion smoothing and differentiation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Length of the uniform moving-average kernel
    pub kernel_size: usize,
    /// Constant factor applied to the gradient (does not affect the sign)
    pub gradient_scale: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            gradient_scale: 3.0,
        }
    }
}

/// Audio loading configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Resample decoded audio to this rate; `None` keeps the file's rate
    pub target_sample_rate: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: Some(22_050),
        }
    }
}

/// Evaluation harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Maximum distance (seconds) for an estimate to match a reference strum
    pub tolerance_window: f64,
    /// Log and skip failing examples instead of aborting the run
    pub continue_on_error: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            tolerance_window: 0.1,
            continue_on_error: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Falls back to the defaults (with a warning) if the file is missing
    /// or cannot be parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_strict(&path) {
            Ok(config) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!("[Config] {}. Using defaults.", err);
                Self::default()
            }
        }
    }

    /// Load configuration from JSON file, failing on any read or parse error
    pub fn load_strict<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|err| DatasetError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.onset.n_fft, 2048);
        assert_eq!(config.onset.hop_size, 512);
        assert_eq!(config.onset.min_onset_gap, 0.15);
        assert_eq!(config.motion.kernel_size, 5);
        assert_eq!(config.motion.gradient_scale, 3.0);
        assert_eq!(config.audio.target_sample_rate, Some(22_050));
        assert_eq!(config.evaluation.tolerance_window, 0.1);
        assert!(!config.evaluation.continue_on_error);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"motion":{"kernel_size":7},"audio":{"target_sample_rate":null}}"#)
                .unwrap();
        assert_eq!(parsed.motion.kernel_size, 7);
        assert_eq!(parsed.motion.gradient_scale, 3.0);
        assert_eq!(parsed.audio.target_sample_rate, None);
        assert_eq!(parsed.onset, OnsetDetectionConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/strum_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_strict_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AppConfig::load_strict(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Config { .. }));
    }
}
