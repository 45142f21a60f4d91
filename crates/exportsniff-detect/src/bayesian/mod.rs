//! Swappable confidence models over [`EvidenceMetrics`].
//!
//! The three scorers estimate P(evidence | ¬format) differently:
//! - [`LogBayesScorer`]: per-tier likelihood ratios, so P(E|¬H) is implied by
//!   Bayes-factor normalization.
//! - [`MvlpScorer`]: no explicit P(E|¬H); a learned nonlinear model maps
//!   metrics straight to confidence.
//! - [`WeightedEvidenceScorer`]: quadratic decay `0.01 + 0.49·(1 − L)²`.
//!
//! None is treated as canonical. The detector picks one by configuration.

pub mod beta;
pub mod log_bayes;
pub mod mvlp;
pub mod optimize;
pub mod parameters;
pub mod priors;
pub mod weighted;

use exportsniff_core::config::ScorerStrategy;
use exportsniff_core::errors::ScoringError;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceMetrics;
use crate::formats::SupportedFormat;

pub use log_bayes::{LogBayesScorer, PosteriorDistribution};
pub use mvlp::MvlpScorer;
pub use optimize::{FitReport, OptimizerBackend, TrainingSample};
pub use parameters::ConfidenceParameters;
pub use priors::FormatPriors;
pub use weighted::WeightedEvidenceScorer;

/// Output of a confidence scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredConfidence {
    /// Posterior confidence in [0, 1].
    pub confidence: f64,
    /// P(evidence | format) as estimated by the scorer.
    pub likelihood: f64,
    pub prior: f64,
    /// Credible interval around `confidence`, when requested and available.
    pub bounds: Option<(f64, f64)>,
    /// False when the scorer runs on a backend that cannot report bounds.
    pub uncertainty_available: bool,
}

/// A confidence model. Implementations must be pure functions of their
/// inputs and their own immutable parameters.
pub trait ConfidenceScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn calculate_confidence(
        &self,
        metrics: &EvidenceMetrics,
        format: SupportedFormat,
        use_uncertainty: bool,
    ) -> Result<ScoredConfidence, ScoringError>;
}

/// Scorer for a configured strategy, with default parameters.
pub fn build_scorer(strategy: ScorerStrategy) -> Box<dyn ConfidenceScorer> {
    match strategy {
        ScorerStrategy::LogBayes => Box::new(LogBayesScorer::default()),
        ScorerStrategy::Mvlp => Box::new(MvlpScorer::default()),
        ScorerStrategy::WeightedEvidence => Box::new(WeightedEvidenceScorer::default()),
    }
}

/// Shared input checks: metrics must be well-formed and the format concrete.
pub(crate) fn check_inputs(metrics: &EvidenceMetrics, format: SupportedFormat) -> Result<(), ScoringError> {
    if format == SupportedFormat::Unknown {
        return Err(ScoringError::UnsupportedFormat {
            format: format.name().to_string(),
        });
    }
    metrics.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scorer_names() {
        assert_eq!(build_scorer(ScorerStrategy::LogBayes).name(), "log_bayes");
        assert_eq!(build_scorer(ScorerStrategy::Mvlp).name(), "mvlp");
        assert_eq!(
            build_scorer(ScorerStrategy::WeightedEvidence).name(),
            "weighted_evidence"
        );
    }

    #[test]
    fn test_every_scorer_rejects_unknown() {
        let m = EvidenceMetrics::new(0.5, 0.9, 0.5, 2, 1);
        for strategy in [
            ScorerStrategy::LogBayes,
            ScorerStrategy::Mvlp,
            ScorerStrategy::WeightedEvidence,
        ] {
            let err = build_scorer(strategy)
                .calculate_confidence(&m, SupportedFormat::Unknown, false)
                .unwrap_err();
            assert!(matches!(err, ScoringError::UnsupportedFormat { .. }));
        }
    }

    #[test]
    fn test_every_scorer_is_bounded() {
        let cases = [
            EvidenceMetrics::empty(),
            EvidenceMetrics::new(1.0, 1.0, 1.0, 9, 9),
            EvidenceMetrics::new(0.2, 0.3, 0.0, 1, 0),
        ];
        for strategy in [
            ScorerStrategy::LogBayes,
            ScorerStrategy::Mvlp,
            ScorerStrategy::WeightedEvidence,
        ] {
            let scorer = build_scorer(strategy);
            for m in &cases {
                let out = scorer
                    .calculate_confidence(m, SupportedFormat::TestRail, true)
                    .unwrap();
                assert!((0.0..=1.0).contains(&out.confidence), "{strategy}: {out:?}");
                if let Some((lo, hi)) = out.bounds {
                    assert!(lo <= hi);
                }
            }
        }
    }
}
