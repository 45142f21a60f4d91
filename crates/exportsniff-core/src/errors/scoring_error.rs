//! Confidence-scoring errors.

use super::error_code::{self, ExportSniffErrorCode};

/// Errors raised by confidence scorers and their parameter estimators.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Invalid confidence parameters ({field}): {message}")]
    InvalidParameters { field: String, message: String },

    #[error("Non-finite metric value for {field}")]
    NonFiniteMetric { field: String },

    #[error("Insufficient training data: need {required} samples, got {actual}")]
    InsufficientTrainingData { required: usize, actual: usize },

    #[error("Format {format} cannot be scored")]
    UnsupportedFormat { format: String },
}

impl ExportSniffErrorCode for ScoringError {
    fn error_code(&self) -> &'static str {
        error_code::SCORING_ERROR
    }
}
