//! # exportsniff-detect
//!
//! Format detection for test-management JSON exports. Classifies a parsed
//! document as Zephyr, Jira/Xray, TestRail, TestLink, generic JSON, or
//! UNKNOWN, and reports a confidence in [0, 1].
//!
//! Start with [`FormatDetector`].

pub mod bayesian;
pub mod cache;
pub mod complexity;
pub mod confidence;
pub mod detector;
pub mod evidence;
pub mod formats;

pub use bayesian::{ConfidenceScorer, OptimizerBackend, ScoredConfidence};
pub use detector::{DetectionOutcome, DetectionPath, DetectionReport, FormatDetector};
pub use evidence::{EvidenceMetrics, EvidenceSummary};
pub use formats::{FormatRegistry, SupportedFormat};
