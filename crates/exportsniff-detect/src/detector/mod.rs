//! Detection facade: circuit breaker, fast path, quick scoring, and the
//! full pipeline.

pub mod circuit;
pub mod fast_path;
pub mod format_detector;
pub mod quick;
pub mod types;

pub use circuit::{CircuitBreaker, CircuitState};
pub use fast_path::FastPathTable;
pub use format_detector::FormatDetector;
pub use quick::QuickScorer;
pub use types::{
    DetectionMetadata, DetectionOutcome, DetectionPath, DetectionReport, DetectorStats,
    DetectorStatsSnapshot,
};
