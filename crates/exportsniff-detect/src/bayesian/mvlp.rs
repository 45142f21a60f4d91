//! Constrained nonlinear scorer fit by least squares.

use exportsniff_core::errors::ScoringError;

use crate::evidence::EvidenceMetrics;
use crate::formats::SupportedFormat;

use super::beta::confidence_bounds;
use super::optimize::{FitReport, OptimizerBackend, TrainingSample};
use super::parameters::ConfidenceParameters;
use super::priors::FormatPriors;
use super::{check_inputs, ConfidenceScorer, ScoredConfidence};

/// Confidence is the aggregated metric model itself; the prior is reported
/// but not combined.
#[derive(Debug, Clone)]
pub struct MvlpScorer {
    parameters: ConfidenceParameters,
    backend: OptimizerBackend,
    priors: FormatPriors,
}

impl Default for MvlpScorer {
    fn default() -> Self {
        Self {
            parameters: ConfidenceParameters::default(),
            backend: OptimizerBackend::detect(),
            priors: FormatPriors::default(),
        }
    }
}

impl MvlpScorer {
    pub fn with_backend(backend: OptimizerBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn with_parameters(parameters: ConfidenceParameters) -> Result<Self, ScoringError> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            ..Self::default()
        })
    }

    /// Scorer fit to `samples`. No samples means default parameters.
    pub fn from_training(samples: &[TrainingSample], backend: OptimizerBackend) -> Result<Self, ScoringError> {
        let mut scorer = Self::with_backend(backend);
        if !samples.is_empty() {
            scorer.fit(samples)?;
        }
        Ok(scorer)
    }

    /// Refit and replace the parameters wholesale.
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

impl ConfidenceScorer for MvlpScorer {
    fn name(&self) -> &'static str {
        "mvlp"
    }

    fn calculate_confidence(
        &self,
        metrics: &EvidenceMetrics,
        format: SupportedFormat,
        use_uncertainty: bool,
    ) -> Result<ScoredConfidence, ScoringError> {
        check_inputs(metrics, format)?;
        let confidence = self.parameters.aggregate(metrics);
        let uncertainty_available = self.backend.provides_uncertainty();
        Ok(ScoredConfidence {
            confidence,
            likelihood: confidence,
            prior: self.priors.prior(format),
            bounds: (use_uncertainty && uncertainty_available)
                .then(|| confidence_bounds(confidence, metrics.evidence_count())),
            uncertainty_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training() -> Vec<TrainingSample> {
        vec![
            TrainingSample::new(EvidenceMetrics::new(0.9, 0.95, 0.6, 5, 3), 0.95),
            TrainingSample::new(EvidenceMetrics::new(0.5, 0.85, 0.2, 5, 1), 0.6),
            TrainingSample::new(EvidenceMetrics::new(0.1, 0.3, 0.0, 1, 0), 0.05),
            TrainingSample::new(EvidenceMetrics::new(0.3, 0.7, 0.0, 2, 0), 0.25),
        ]
    }

    #[test]
    fn test_defaults_without_training() {
        let scorer = MvlpScorer::from_training(&[], OptimizerBackend::Heuristic).unwrap();
        assert_eq!(*scorer.parameters(), ConfidenceParameters::default());
    }

    #[test]
    fn test_fit_replaces_parameters() {
        let scorer = MvlpScorer::from_training(&training(), OptimizerBackend::ConstrainedOptimizer).unwrap();
        assert!(scorer.parameters().validate().is_ok());
        let hi = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.9, 0.95, 0.6, 5, 3), SupportedFormat::Zephyr, false)
            .unwrap();
        let lo = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.1, 0.3, 0.0, 1, 0), SupportedFormat::Zephyr, false)
            .unwrap();
        assert!(hi.confidence > lo.confidence);
    }

    #[test]
    fn test_heuristic_backend_reports_no_bounds() {
        let scorer = MvlpScorer::with_backend(OptimizerBackend::Heuristic);
        let out = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.5, 0.9, 0.3, 3, 1), SupportedFormat::JiraXray, true)
            .unwrap();
        assert!(out.bounds.is_none());
        assert!(!out.uncertainty_available);
    }
}
