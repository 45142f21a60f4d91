//! Minimum-sufficiency bar for a full-scoring winner.

use exportsniff_core::config::DetectionConfig;

use super::accumulator::EvidenceMetrics;

/// Decides whether the arg-max format has enough evidence to be reported.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceEvaluator {
    min_score: f64,
    min_confidence: f64,
}

impl EvidenceEvaluator {
    pub fn new(min_score: f64, min_confidence: f64) -> Self {
        Self {
            min_score,
            min_confidence,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.effective_min_detection_score(),
            config.effective_min_detection_confidence(),
        )
    }

    /// True when the raw score clears the bar, at least one item was seen,
    /// and the scorer's confidence clears the confidence floor.
    pub fn is_sufficient_for_detection(
        &self,
        raw_score: f64,
        metrics: &EvidenceMetrics,
        scorer_confidence: f64,
    ) -> bool {
        metrics.evidence_count() > 0
            && raw_score >= self.min_score
            && scorer_confidence >= self.min_confidence
    }
}

impl Default for EvidenceEvaluator {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
