//! Weighted-evidence scorer: nonlinear likelihood combined by Bayes' rule.
//!
//! ```text
//! L         = aggregate(metrics)
//! P(E|¬H)   = 0.01 + 0.49·(1 − L)²
//! posterior = L·P(H) / (L·P(H) + P(E|¬H)·(1 − P(H)))
//! ```

use exportsniff_core::errors::ScoringError;

use crate::evidence::EvidenceMetrics;
use crate::formats::SupportedFormat;

use super::beta::confidence_bounds;
use super::optimize::{FitReport, OptimizerBackend, TrainingSample};
use super::parameters::ConfidenceParameters;
use super::priors::FormatPriors;
use super::{check_inputs, ConfidenceScorer, ScoredConfidence};

/// Quadratic-decay estimate of P(evidence | ¬format).
pub fn evidence_given_not_format(likelihood: f64) -> f64 {
    let l = likelihood.clamp(0.0, 1.0);
    0.01 + 0.49 * (1.0 - l).powi(2)
}

#[derive(Debug, Clone)]
pub struct WeightedEvidenceScorer {
    parameters: ConfidenceParameters,
    backend: OptimizerBackend,
    priors: FormatPriors,
}

impl Default for WeightedEvidenceScorer {
    fn default() -> Self {
        Self {
            parameters: ConfidenceParameters::default(),
            backend: OptimizerBackend::detect(),
            priors: FormatPriors::default(),
        }
    }
}

impl WeightedEvidenceScorer {
    pub fn new(parameters: ConfidenceParameters, backend: OptimizerBackend, priors: FormatPriors) -> Result<Self, ScoringError> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            backend,
            priors,
        })
    }

    pub fn with_backend(backend: OptimizerBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Estimate parameters from labeled likelihoods with this scorer's
    /// backend and replace the current ones.
    pub fn fit(&mut self, samples: &[TrainingSample]) -> Result<FitReport, ScoringError> {
        let report = self.backend.fit(&self.parameters, samples)?;
        self.parameters = report.parameters;
        Ok(report)
    }

    pub fn parameters(&self) -> &ConfidenceParameters {
        &self.parameters
    }

    pub fn backend(&self) -> OptimizerBackend {
        self.backend
    }
}

impl ConfidenceScorer for WeightedEvidenceScorer {
    fn name(&self) -> &'static str {
        "weighted_evidence"
    }

    fn calculate_confidence(
        &self,
        metrics: &EvidenceMetrics,
        format: SupportedFormat,
        use_uncertainty: bool,
    ) -> Result<ScoredConfidence, ScoringError> {
        check_inputs(metrics, format)?;
        let prior = self.priors.prior(format);
        let likelihood = self.parameters.aggregate(metrics);
        let numerator = likelihood * prior;
        let denominator = numerator + evidence_given_not_format(likelihood) * (1.0 - prior);
        let confidence = if denominator > 0.0 {
            (numerator / denominator).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let uncertainty_available = self.backend.provides_uncertainty();
        Ok(ScoredConfidence {
            confidence,
            likelihood,
            prior,
            bounds: (use_uncertainty && uncertainty_available)
                .then(|| confidence_bounds(confidence, metrics.evidence_count())),
            uncertainty_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_endpoints() {
        assert!((evidence_given_not_format(0.0) - 0.5).abs() < 1e-12);
        assert!((evidence_given_not_format(1.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_posterior_values() {
        let scorer = WeightedEvidenceScorer::default();
        let none = scorer
            .calculate_confidence(&EvidenceMetrics::empty(), SupportedFormat::Generic, false)
            .unwrap();
        assert_eq!(none.confidence, 0.0);

        // L = 0.4·0.3 + 0.35·0.85 + 0.1·0.3·0.85 = 0.443
        let m = EvidenceMetrics::new(0.3, 0.85, 0.0, 4, 0);
        let out = scorer
            .calculate_confidence(&m, SupportedFormat::Generic, false)
            .unwrap();
        assert!((out.likelihood - 0.443).abs() < 1e-9);
        assert!(out.confidence > 0.35 && out.confidence < 0.45, "{}", out.confidence);
    }

    #[test]
    fn test_more_evidence_raises_confidence() {
        let scorer = WeightedEvidenceScorer::default();
        let weak = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.2, 0.7, 0.0, 2, 0), SupportedFormat::TestRail, false)
            .unwrap();
        let strong = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.7, 0.9, 0.5, 6, 3), SupportedFormat::TestRail, false)
            .unwrap();
        assert!(strong.confidence > weak.confidence);
    }

    #[test]
    fn test_backend_controls_bounds() {
        let m = EvidenceMetrics::new(0.6, 0.9, 0.4, 5, 2);
        let heuristic = WeightedEvidenceScorer::with_backend(OptimizerBackend::Heuristic)
            .calculate_confidence(&m, SupportedFormat::Zephyr, true)
            .unwrap();
        assert!(heuristic.bounds.is_none());
        assert!(!heuristic.uncertainty_available);

        let optimized = WeightedEvidenceScorer::with_backend(OptimizerBackend::ConstrainedOptimizer)
            .calculate_confidence(&m, SupportedFormat::Zephyr, true)
            .unwrap();
        let (lo, hi) = optimized.bounds.unwrap();
        assert!(lo <= optimized.confidence && optimized.confidence <= hi);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let params = ConfidenceParameters {
            weights: [1.0, 1.0, 1.0],
            ..ConfidenceParameters::default()
        };
        assert!(WeightedEvidenceScorer::new(params, OptimizerBackend::Heuristic, FormatPriors::default()).is_err());
    }
}
