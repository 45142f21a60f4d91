//! Relative confidence calculation and the required-key penalty.

pub mod calculator;
pub mod penalty;

pub use calculator::ConfidenceCalculator;
pub use penalty::{required_key_penalty, RequiredKeyCoverage};
