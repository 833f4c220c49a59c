// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Analysis error code constants
///
/// Error code range: 1001-1004
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Waveform contains no samples
    pub const EMPTY_WAVEFORM: i32 = 1001;

    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 1002;

    /// Motion signal contains no samples
    pub const EMPTY_MOTION: i32 = 1003;

    /// Motion values and timestamps differ in length
    pub const MOTION_LENGTH_MISMATCH: i32 = 1004;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=StrumDetector, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Precondition violations of the strum detection core
///
/// The detector itself is total on well-formed input; these errors are
/// raised by the checked entry points before any numeric work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("waveform is empty")]
    EmptyWaveform,

    #[error("sample rate must be greater than 0 (got {sample_rate})")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("motion signal is empty")]
    EmptyMotion,

    #[error("motion signal has {values} values but {timestamps} timestamps")]
    MotionLengthMismatch { values: usize, timestamps: usize },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::EmptyWaveform => AnalysisErrorCodes::EMPTY_WAVEFORM,
            AnalysisError::InvalidSampleRate { .. } => AnalysisErrorCodes::INVALID_SAMPLE_RATE,
            AnalysisError::EmptyMotion => AnalysisErrorCodes::EMPTY_MOTION,
            AnalysisError::MotionLengthMismatch { .. } => {
                AnalysisErrorCodes::MOTION_LENGTH_MISMATCH
            }
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
