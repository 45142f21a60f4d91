//! Complexity gate in front of full detection.

pub mod analyzer;

pub use analyzer::{ComplexityAnalyzer, ComplexityAssessment, ComplexityReason, ComplexityStats};
