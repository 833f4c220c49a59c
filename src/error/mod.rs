// Error types for the strum evaluation crate
//
// This module defines typed errors for the analysis core and the dataset
// harness, with numeric codes for structured reporting.

mod analysis;
mod dataset;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use dataset::{log_dataset_error, DatasetError, DatasetErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so the CLI and logs report failures
/// consistently.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
