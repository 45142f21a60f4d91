//! Coefficients of the nonlinear metric aggregation shared by the MVLP and
//! weighted-evidence scorers.
//!
//! ```text
//! L = w_c·c^p_c + w_q·q^p_q + w_u·u^p_u + i_cq·c·q + i_cu·c·u
//! ```
//!
//! clamped to `[min_confidence, max_confidence]`.

use exportsniff_core::errors::ScoringError;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceMetrics;

pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;
pub const POWER_MIN: f64 = 0.1;
pub const POWER_MAX: f64 = 2.0;
pub const INTERACTION_BOUND: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceParameters {
    /// Completeness, quality, uniqueness weights. Sum to 1.
    pub weights: [f64; 3],
    /// Power exponents, each in [0.1, 2.0].
    pub powers: [f64; 3],
    /// Completeness×quality and completeness×uniqueness coefficients.
    pub interactions: [f64; 2],
    pub min_confidence: f64,
    pub max_confidence: f64,
}

impl Default for ConfidenceParameters {
    fn default() -> Self {
        Self {
            weights: [0.40, 0.35, 0.25],
            powers: [1.0, 1.0, 1.0],
            interactions: [0.10, 0.05],
            min_confidence: 0.0,
            max_confidence: 1.0,
        }
    }
}

impl ConfidenceParameters {
    pub fn validate(&self) -> Result<(), ScoringError> {
        let mut all = self
            .weights
            .iter()
            .chain(&self.powers)
            .chain(&self.interactions)
            .chain([&self.min_confidence, &self.max_confidence]);
        if all.any(|v| !v.is_finite()) {
            return Err(invalid("parameters", "all coefficients must be finite"));
        }
        if self.weights.iter().any(|w| *w < 0.0) {
            return Err(invalid("weights", "weights must be non-negative"));
        }
        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid("weights", format!("weights sum to {sum:.4}, expected 1.0")));
        }
        if let Some(p) = self.powers.iter().find(|p| !(POWER_MIN..=POWER_MAX).contains(*p)) {
            return Err(invalid(
                "powers",
                format!("power {p} is outside [{POWER_MIN}, {POWER_MAX}]"),
            ));
        }
        if self.interactions.iter().any(|i| i.abs() > INTERACTION_BOUND) {
            return Err(invalid(
                "interactions",
                format!("interaction coefficients must be within ±{INTERACTION_BOUND}"),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence)
            || !(0.0..=1.0).contains(&self.max_confidence)
            || self.min_confidence > self.max_confidence
        {
            return Err(invalid(
                "bounds",
                format!(
                    "need 0 <= min ({}) <= max ({}) <= 1",
                    self.min_confidence, self.max_confidence
                ),
            ));
        }
        Ok(())
    }

    /// Aggregate likelihood of the metrics under these coefficients.
    pub fn aggregate(&self, metrics: &EvidenceMetrics) -> f64 {
        let x = [metrics.completeness(), metrics.quality(), metrics.uniqueness()];
        let base: f64 = (0..3)
            .map(|i| self.weights[i] * x[i].powf(self.powers[i]))
            .sum();
        let interaction = self.interactions[0] * x[0] * x[1] + self.interactions[1] * x[0] * x[2];
        let value = base + interaction;
        if value.is_nan() {
            return self.min_confidence;
        }
        value.clamp(self.min_confidence, self.max_confidence)
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ScoringError {
    ScoringError::InvalidParameters {
        field: field.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfidenceParameters::default().validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut p = ConfidenceParameters::default();
        p.weights = [0.5, 0.5, 0.5];
        assert!(p.validate().is_err());

        let mut p = ConfidenceParameters::default();
        p.powers[1] = 2.5;
        assert!(p.validate().is_err());

        let mut p = ConfidenceParameters::default();
        p.min_confidence = 0.9;
        p.max_confidence = 0.1;
        assert!(p.validate().is_err());

        let mut p = ConfidenceParameters::default();
        p.interactions[0] = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_aggregate() {
        let p = ConfidenceParameters::default();
        assert_eq!(p.aggregate(&EvidenceMetrics::empty()), 0.0);

        let full = EvidenceMetrics::new(1.0, 1.0, 1.0, 4, 4);
        assert_eq!(p.aggregate(&full), 1.0);

        let m = EvidenceMetrics::new(0.5, 0.8, 0.0, 3, 0);
        let expected = 0.4 * 0.5 + 0.35 * 0.8 + 0.1 * 0.5 * 0.8;
        assert!((p.aggregate(&m) - expected).abs() < 1e-12);
    }
}
