// Dataset error types and constants

use crate::error::{AnalysisError, ErrorCode};
use log::error;
use std::path::PathBuf;
use thiserror::Error;

/// Dataset error code constants
///
/// Error code range: 2001-2009
pub struct DatasetErrorCodes {}

impl DatasetErrorCodes {
    /// File could not be read
    pub const IO: i32 = 2001;

    /// Paired file of an example is missing
    pub const MISSING_FILE: i32 = 2002;

    /// Row of a delimited text file could not be parsed
    pub const PARSE: i32 = 2003;

    /// Audio file could not be decoded
    pub const AUDIO_DECODE: i32 = 2004;

    /// Audio format is not supported
    pub const UNSUPPORTED_AUDIO: i32 = 2005;

    /// Motion signal cannot be normalized (all zero)
    pub const DEGENERATE_MOTION: i32 = 2006;

    /// Configuration file is invalid
    pub const CONFIG: i32 = 2007;

    /// Dataset directory contains no examples
    pub const EMPTY_CORPUS: i32 = 2008;

    /// Analysis core rejected the loaded example
    pub const ANALYSIS: i32 = 2009;
}

/// Log a dataset error with structured context
pub fn log_dataset_error(err: &DatasetError, context: &str) {
    error!(
        "Dataset error in {}: code={}, component=Dataset, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while locating, loading or evaluating dataset examples
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing {kind} file {}", path.display())]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to decode audio {}: {source}", path.display())]
    AudioDecode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("unsupported audio {}: {reason}", path.display())]
    UnsupportedAudio { path: PathBuf, reason: String },

    #[error("motion signal in {} has zero maximum amplitude", path.display())]
    DegenerateMotion { path: PathBuf },

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("no examples found in {}", dir.display())]
    EmptyCorpus { dir: PathBuf },

    #[error("example '{example}': {source}")]
    Analysis {
        example: String,
        #[source]
        source: AnalysisError,
    },
}

impl ErrorCode for DatasetError {
    fn code(&self) -> i32 {
        match self {
            DatasetError::Io { .. } => DatasetErrorCodes::IO,
            DatasetError::MissingFile { .. } => DatasetErrorCodes::MISSING_FILE,
            DatasetError::Parse { .. } => DatasetErrorCodes::PARSE,
            DatasetError::AudioDecode { .. } => DatasetErrorCodes::AUDIO_DECODE,
            DatasetError::UnsupportedAudio { .. } => DatasetErrorCodes::UNSUPPORTED_AUDIO,
            DatasetError::DegenerateMotion { .. } => DatasetErrorCodes::DEGENERATE_MOTION,
            DatasetError::Config { .. } => DatasetErrorCodes::CONFIG,
            DatasetError::EmptyCorpus { .. } => DatasetErrorCodes::EMPTY_CORPUS,
            DatasetError::Analysis { .. } => DatasetErrorCodes::ANALYSIS,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_points_at_line() {
        let err = DatasetError::Parse {
            path: PathBuf::from("dataset/a.csv"),
            line: 7,
            reason: "expected 2 columns".to_string(),
        };
        assert_eq!(err.code(), DatasetErrorCodes::PARSE);
        assert_eq!(err.message(), "dataset/a.csv:7: expected 2 columns");
    }

    #[test]
    fn test_analysis_error_is_wrapped_with_example_name() {
        let err = DatasetError::Analysis {
            example: "take_01".to_string(),
            source: AnalysisError::EmptyMotion,
        };
        assert_eq!(err.code(), DatasetErrorCodes::ANALYSIS);
        assert!(err.message().contains("take_01"));
        assert!(err.message().contains("motion signal is empty"));
    }
}
