//! Log-Bayes-factor accumulation.
//!
//! Each item contributes `ln(1 + (LR − 1)·confidence)` to a log posterior
//! that starts at `ln(prior)`. Across formats, posteriors are normalized
//! with a log-sum-exp softmax.

use exportsniff_core::errors::ScoringError;
use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceItem, EvidenceMetrics, EvidenceWeight};
use crate::formats::SupportedFormat;

use super::beta::confidence_bounds;
use super::priors::FormatPriors;
use super::{check_inputs, ConfidenceScorer, ScoredConfidence};

/// Likelihood ratio P(item | format) / P(item | ¬format) per tier.
pub fn likelihood_ratio(weight: EvidenceWeight) -> f64 {
    match weight {
        EvidenceWeight::Unique => 20.0,
        EvidenceWeight::Strong => 8.0,
        EvidenceWeight::Moderate => 3.0,
        EvidenceWeight::Weak => 1.5,
        EvidenceWeight::None => 1.0,
    }
}

/// Log Bayes factor of one item.
pub fn item_log_factor(weight: EvidenceWeight, confidence: f64) -> f64 {
    let c = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (1.0 + (likelihood_ratio(weight) - 1.0) * c).ln()
}

/// Normalized posterior over candidate formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorDistribution {
    pub posteriors: Vec<(SupportedFormat, f64)>,
    /// Shannon entropy in nats.
    pub entropy: f64,
    /// Entropy divided by its maximum, in [0, 1]. 1 means no preference.
    pub normalized_entropy: f64,
}

impl PosteriorDistribution {
    pub fn probability(&self, format: SupportedFormat) -> f64 {
        self.posteriors
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    pub fn most_likely(&self) -> Option<(SupportedFormat, f64)> {
        self.posteriors
            .iter()
            .copied()
            .fold(None, |best, (f, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((f, p)),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogBayesScorer {
    priors: FormatPriors,
}

impl LogBayesScorer {
    pub fn with_priors(priors: FormatPriors) -> Self {
        Self { priors }
    }

    /// Unnormalized log posterior of `format` given its evidence.
    pub fn log_posterior(&self, format: SupportedFormat, items: &[EvidenceItem]) -> f64 {
        let prior = self.priors.prior(format).max(f64::MIN_POSITIVE);
        prior.ln()
            + items
                .iter()
                .map(|i| item_log_factor(i.weight, i.confidence))
                .sum::<f64>()
    }

    /// Softmax of the log posteriors of every `(format, evidence)` entry.
    pub fn posterior_distribution(&self, evidence: &[(SupportedFormat, &[EvidenceItem])]) -> PosteriorDistribution {
        if evidence.is_empty() {
            return PosteriorDistribution {
                posteriors: Vec::new(),
                entropy: 0.0,
                normalized_entropy: 0.0,
            };
        }
        let logs: Vec<f64> = evidence
            .iter()
            .map(|(f, items)| self.log_posterior(*f, items))
            .collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_sum = max + logs.iter().map(|l| (l - max).exp()).sum::<f64>().ln();

        let posteriors: Vec<(SupportedFormat, f64)> = evidence
            .iter()
            .zip(&logs)
            .map(|((f, _), l)| (*f, (l - log_sum).exp()))
            .collect();
        let entropy = -posteriors
            .iter()
            .filter(|(_, p)| *p > 0.0)
            .map(|(_, p)| p * p.ln())
            .sum::<f64>();
        let max_entropy = (posteriors.len() as f64).ln();
        let normalized_entropy = if max_entropy > 0.0 {
            (entropy / max_entropy).clamp(0.0, 1.0)
        } else {
            0.0
        };
        PosteriorDistribution {
            posteriors,
            entropy: entropy.max(0.0),
            normalized_entropy,
        }
    }
}

impl ConfidenceScorer for LogBayesScorer {
    fn name(&self) -> &'static str {
        "log_bayes"
    }

    /// Rebuilds the evidence from metrics alone: unique items at the unique
    /// ratio, the rest at the moderate ratio, all at the mean confidence.
    /// The posterior is normalized against the single alternative ¬format.
    fn calculate_confidence(
        &self,
        metrics: &EvidenceMetrics,
        format: SupportedFormat,
        use_uncertainty: bool,
    ) -> Result<ScoredConfidence, ScoringError> {
        check_inputs(metrics, format)?;
        let prior = self.priors.prior(format);
        let unique = metrics.unique_count() as f64;
        let other = (metrics.evidence_count() - metrics.unique_count()) as f64;
        let log_factor = unique * item_log_factor(EvidenceWeight::Unique, metrics.quality())
            + other * item_log_factor(EvidenceWeight::Moderate, metrics.quality());

        let prior_odds = if prior <= 0.0 {
            f64::NEG_INFINITY
        } else if prior >= 1.0 {
            f64::INFINITY
        } else {
            (prior / (1.0 - prior)).ln()
        };
        let confidence = sigmoid(prior_odds + log_factor);
        let likelihood = sigmoid(log_factor);

        Ok(ScoredConfidence {
            confidence,
            likelihood,
            prior,
            bounds: use_uncertainty.then(|| confidence_bounds(confidence, metrics.evidence_count())),
            uncertainty_available: true,
        })
    }
}

fn sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        return 0.5;
    }
    let x = x.clamp(-50.0, 50.0);
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceSource;

    fn item(weight: EvidenceWeight, confidence: f64) -> EvidenceItem {
        EvidenceItem::new(EvidenceSource::RequiredKey, weight, confidence, "t")
    }

    #[test]
    fn test_item_factor() {
        assert!((item_log_factor(EvidenceWeight::Unique, 1.0) - 20.0_f64.ln()).abs() < 1e-12);
        assert_eq!(item_log_factor(EvidenceWeight::Strong, 0.0), 0.0);
        assert_eq!(item_log_factor(EvidenceWeight::None, 1.0), 0.0);
    }

    #[test]
    fn test_distribution_sums_to_one_and_prefers_evidence() {
        let scorer = LogBayesScorer::default();
        let zephyr = vec![item(EvidenceWeight::Unique, 0.95), item(EvidenceWeight::Unique, 0.95)];
        let testlink = vec![item(EvidenceWeight::Strong, 0.95)];
        let none: Vec<EvidenceItem> = Vec::new();
        let dist = scorer.posterior_distribution(&[
            (SupportedFormat::Zephyr, &zephyr),
            (SupportedFormat::TestLink, &testlink),
            (SupportedFormat::TestRail, &none),
        ]);
        let sum: f64 = dist.posteriors.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(dist.most_likely().unwrap().0, SupportedFormat::Zephyr);
        assert!(dist.normalized_entropy < 0.5);
    }

    #[test]
    fn test_uniform_distribution_has_max_entropy() {
        let scorer = LogBayesScorer::with_priors(FormatPriors::from_weights([1.0; 6]));
        let none: Vec<EvidenceItem> = Vec::new();
        let dist = scorer.posterior_distribution(&[
            (SupportedFormat::Zephyr, &none),
            (SupportedFormat::JiraXray, &none),
        ]);
        assert!((dist.normalized_entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_from_metrics() {
        let scorer = LogBayesScorer::default();
        let none = scorer
            .calculate_confidence(&EvidenceMetrics::empty(), SupportedFormat::Zephyr, false)
            .unwrap();
        assert!((none.confidence - 0.2).abs() < 1e-9);
        assert!(none.bounds.is_none());

        let strong = scorer
            .calculate_confidence(&EvidenceMetrics::new(0.7, 0.95, 0.75, 4, 3), SupportedFormat::Zephyr, true)
            .unwrap();
        assert!(strong.confidence > 0.99);
        assert!(strong.bounds.is_some());
        assert!(strong.uncertainty_available);
    }
}
