//! Parameter estimation for the nonlinear scorers.
//!
//! Two backends fit [`ConfidenceParameters`] to labeled samples by
//! minimizing mean squared error:
//! - `ConstrainedOptimizer`: projected gradient descent with backtracking.
//!   Weights are projected onto the probability simplex, powers and
//!   interactions are clamped to their boxes after every step.
//! - `Heuristic`: per-metric least-squares slopes normalized into weights.
//!   Powers and interactions keep their defaults.
//!
//! The constrained backend is compiled in with the `optimizer` feature.

use std::fmt;

use exportsniff_core::errors::ScoringError;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceMetrics;

use super::parameters::{ConfidenceParameters, INTERACTION_BOUND, POWER_MAX, POWER_MIN};

/// Fewest labeled samples either backend accepts.
pub const MIN_TRAINING_SAMPLES: usize = 3;

const MAX_ITERATIONS: usize = 500;
const INITIAL_STEP: f64 = 0.5;
const MIN_STEP: f64 = 1e-8;
const CONVERGENCE_TOLERANCE: f64 = 1e-12;
const GRADIENT_EPSILON: f64 = 1e-6;

/// How scorer parameters are estimated and whether bounds are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerBackend {
    ConstrainedOptimizer,
    Heuristic,
}

impl OptimizerBackend {
    /// Backend available in this build.
    pub fn detect() -> Self {
        if cfg!(feature = "optimizer") {
            Self::ConstrainedOptimizer
        } else {
            Self::Heuristic
        }
    }

    /// Whether scorers on this backend can report credible bounds.
    pub fn provides_uncertainty(&self) -> bool {
        matches!(self, Self::ConstrainedOptimizer)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConstrainedOptimizer => "constrained_optimizer",
            Self::Heuristic => "heuristic",
        }
    }

    /// Fit parameters to `samples`, starting from `initial`.
    pub fn fit(
        &self,
        initial: &ConfidenceParameters,
        samples: &[TrainingSample],
    ) -> Result<FitReport, ScoringError> {
        check_samples(samples)?;
        initial.validate()?;
        let parameters = match self {
            Self::ConstrainedOptimizer => projected_gradient(initial, samples),
            Self::Heuristic => heuristic_estimate(initial, samples),
        };
        parameters.validate()?;
        let report = FitReport {
            backend: *self,
            mse: mean_squared_error(&parameters, samples),
            initial_mse: mean_squared_error(initial, samples),
            parameters,
        };
        tracing::debug!(
            backend = self.name(),
            samples = samples.len(),
            initial_mse = report.initial_mse,
            mse = report.mse,
            "fitted confidence parameters"
        );
        Ok(report)
    }
}

impl fmt::Display for OptimizerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One labeled observation: metrics and the confidence they should yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub metrics: EvidenceMetrics,
    pub expected: f64,
}

impl TrainingSample {
    pub fn new(metrics: EvidenceMetrics, expected: f64) -> Self {
        Self { metrics, expected }
    }
}

/// Outcome of a parameter fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub backend: OptimizerBackend,
    pub parameters: ConfidenceParameters,
    pub initial_mse: f64,
    pub mse: f64,
}

pub fn mean_squared_error(params: &ConfidenceParameters, samples: &[TrainingSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let diff = params.aggregate(&s.metrics) - s.expected;
            diff * diff
        })
        .sum();
    sum / samples.len() as f64
}

fn check_samples(samples: &[TrainingSample]) -> Result<(), ScoringError> {
    if samples.len() < MIN_TRAINING_SAMPLES {
        return Err(ScoringError::InsufficientTrainingData {
            required: MIN_TRAINING_SAMPLES,
            actual: samples.len(),
        });
    }
    for s in samples {
        s.metrics.validate()?;
        if !s.expected.is_finite() || !(0.0..=1.0).contains(&s.expected) {
            return Err(ScoringError::InvalidParameters {
                field: "expected".to_string(),
                message: format!("expected confidence {} is outside [0, 1]", s.expected),
            });
        }
    }
    Ok(())
}

// Free coefficients in a fixed order: 3 weights, 3 powers, 2 interactions.
const DIM: usize = 8;

fn to_vector(p: &ConfidenceParameters) -> [f64; DIM] {
    [
        p.weights[0],
        p.weights[1],
        p.weights[2],
        p.powers[0],
        p.powers[1],
        p.powers[2],
        p.interactions[0],
        p.interactions[1],
    ]
}

fn from_vector(v: &[f64; DIM], template: &ConfidenceParameters) -> ConfidenceParameters {
    ConfidenceParameters {
        weights: [v[0], v[1], v[2]],
        powers: [v[3], v[4], v[5]],
        interactions: [v[6], v[7]],
        ..*template
    }
}

/// Euclidean projection onto { w : w_i >= 0, Σ w_i = 1 }.
pub(crate) fn project_simplex(w: [f64; 3]) -> [f64; 3] {
    let mut sorted = w;
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (i as f64 + 1.0);
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    w.map(|x| (x - theta).max(0.0))
}

fn project(v: &mut [f64; DIM]) {
    let w = project_simplex([v[0], v[1], v[2]]);
    v[..3].copy_from_slice(&w);
    for p in &mut v[3..6] {
        *p = p.clamp(POWER_MIN, POWER_MAX);
    }
    for i in &mut v[6..8] {
        *i = i.clamp(-INTERACTION_BOUND, INTERACTION_BOUND);
    }
}

fn projected_gradient(initial: &ConfidenceParameters, samples: &[TrainingSample]) -> ConfidenceParameters {
    let loss = |v: &[f64; DIM]| mean_squared_error(&from_vector(v, initial), samples);

    let mut x = to_vector(initial);
    project(&mut x);
    let mut current = loss(&x);
    let mut step = INITIAL_STEP;

    for _ in 0..MAX_ITERATIONS {
        let mut grad = [0.0; DIM];
        for (i, g) in grad.iter_mut().enumerate() {
            let mut hi = x;
            let mut lo = x;
            hi[i] += GRADIENT_EPSILON;
            lo[i] -= GRADIENT_EPSILON;
            *g = (loss(&hi) - loss(&lo)) / (2.0 * GRADIENT_EPSILON);
        }

        let mut improved = false;
        while step >= MIN_STEP {
            let mut candidate = x;
            for (c, g) in candidate.iter_mut().zip(grad) {
                *c -= step * g;
            }
            project(&mut candidate);
            let value = loss(&candidate);
            if value < current {
                let gain = current - value;
                x = candidate;
                current = value;
                improved = gain > CONVERGENCE_TOLERANCE;
                step *= 1.5;
                break;
            }
            step *= 0.5;
        }
        if !improved {
            break;
        }
    }

    from_vector(&x, initial)
}

fn heuristic_estimate(initial: &ConfidenceParameters, samples: &[TrainingSample]) -> ConfidenceParameters {
    let mut slopes = [0.0; 3];
    for (i, slope) in slopes.iter_mut().enumerate() {
        let (mut xy, mut xx) = (0.0, 0.0);
        for s in samples {
            let x = [
                s.metrics.completeness(),
                s.metrics.quality(),
                s.metrics.uniqueness(),
            ][i];
            xy += x * s.expected;
            xx += x * x;
        }
        *slope = if xx > 0.0 { (xy / xx).max(0.0) } else { 0.0 };
    }
    let total: f64 = slopes.iter().sum();
    let weights = if total > 0.0 {
        slopes.map(|s| s / total)
    } else {
        ConfidenceParameters::default().weights
    };
    ConfidenceParameters {
        weights,
        ..*initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples_from(target: &ConfidenceParameters) -> Vec<TrainingSample> {
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        let mut out = Vec::new();
        for &c in &grid {
            for &q in &grid {
                for &u in &[0.0, 0.5, 1.0] {
                    let m = EvidenceMetrics::new(c, q, u, 4, (u * 4.0) as usize);
                    out.push(TrainingSample::new(m, target.aggregate(&m)));
                }
            }
        }
        out
    }

    #[test]
    fn test_simplex_projection() {
        let w = project_simplex([0.8, 0.6, -0.2]);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|x| *x >= 0.0));
        let kept = project_simplex([0.2, 0.3, 0.5]);
        for (a, b) in kept.iter().zip([0.2, 0.3, 0.5]) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constrained_fit_reduces_error() {
        let target = ConfidenceParameters {
            weights: [0.2, 0.6, 0.2],
            powers: [1.0, 0.8, 1.2],
            interactions: [0.0, 0.0],
            ..ConfidenceParameters::default()
        };
        let samples = samples_from(&target);
        let report = OptimizerBackend::ConstrainedOptimizer
            .fit(&ConfidenceParameters::default(), &samples)
            .unwrap();
        assert!(report.mse < report.initial_mse);
        assert!(report.parameters.validate().is_ok());
    }

    #[test]
    fn test_heuristic_fit_keeps_constraints() {
        let samples = samples_from(&ConfidenceParameters::default());
        let report = OptimizerBackend::Heuristic
            .fit(&ConfidenceParameters::default(), &samples)
            .unwrap();
        assert!(report.parameters.validate().is_ok());
        assert_eq!(report.parameters.powers, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_insufficient_and_invalid_samples() {
        let m = EvidenceMetrics::new(0.5, 0.5, 0.5, 2, 1);
        let err = OptimizerBackend::Heuristic
            .fit(&ConfidenceParameters::default(), &[TrainingSample::new(m, 0.5)])
            .unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientTrainingData { required: 3, actual: 1 }));

        let bad = vec![TrainingSample::new(m, 1.5); 3];
        assert!(OptimizerBackend::ConstrainedOptimizer
            .fit(&ConfidenceParameters::default(), &bad)
            .is_err());
    }

    #[test]
    fn test_detect_matches_feature() {
        let backend = OptimizerBackend::detect();
        assert_eq!(backend.provides_uncertainty(), cfg!(feature = "optimizer"));
    }
}
