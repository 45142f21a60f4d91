//! Detection errors.

use super::error_code::{self, ExportSniffErrorCode};
use super::ScoringError;

/// Errors that can occur inside the format-detection pipeline.
///
/// None of these reach a `detect_format` caller: the detector folds them
/// into an UNKNOWN result and the circuit breaker.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid format definition for {format}: {message}")]
    InvalidFormatDefinition { format: String, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Input of {size_bytes} bytes exceeds the {limit_bytes} byte limit")]
    InputTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Detector {id} panicked: {message}")]
    DetectorPanic { id: String, message: String },

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

impl ExportSniffErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InputTooLarge { .. } => error_code::INPUT_TOO_LARGE,
            Self::InvalidJson(_) => error_code::INVALID_JSON,
            Self::DetectorPanic { .. } => error_code::DETECTOR_PANIC,
            Self::Scoring(e) => e.error_code(),
            _ => error_code::DETECTION_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_error_keeps_its_code() {
        let err: DetectionError = ScoringError::NonFiniteMetric {
            field: "quality".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), error_code::SCORING_ERROR);
    }

    #[test]
    fn test_coded_string_format() {
        let err = DetectionError::InputTooLarge {
            size_bytes: 20,
            limit_bytes: 10,
        };
        assert_eq!(
            err.coded_string(),
            "[INPUT_TOO_LARGE] Input of 20 bytes exceeds the 10 byte limit"
        );
    }
}
