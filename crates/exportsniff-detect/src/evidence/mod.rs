//! Evidence collection, accumulation, and sufficiency checks.

pub mod accumulator;
pub mod collector;
pub mod context;
pub mod evaluator;
pub mod sample;
pub mod types;

pub use accumulator::{EvidenceAccumulator, EvidenceMetrics, EvidenceProfile, FormatScore};
pub use collector::EvidenceCollector;
pub use context::ContextSearcher;
pub use evaluator::EvidenceEvaluator;
pub use sample::{KeyContext, KeyIndex, Sample};
pub use types::{EvidenceItem, EvidenceSource, EvidenceSummary, EvidenceWeight};
