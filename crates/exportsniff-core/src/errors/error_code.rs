//! ExportSniffErrorCode trait for boundary conversion.

/// Trait for converting exportsniff errors to structured error codes.
/// Every error enum implements this so the ingestion layer can record a
/// stable code string next to the message.
pub trait ExportSniffErrorCode {
    /// Returns the error code string (e.g., "DETECTION_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted boundary string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const DETECTION_ERROR: &str = "DETECTION_ERROR";
pub const SCORING_ERROR: &str = "SCORING_ERROR";
pub const INPUT_TOO_LARGE: &str = "INPUT_TOO_LARGE";
pub const INVALID_JSON: &str = "INVALID_JSON";
pub const DETECTOR_PANIC: &str = "DETECTOR_PANIC";
