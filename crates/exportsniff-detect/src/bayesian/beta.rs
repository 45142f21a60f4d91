//! Beta credible intervals for scorer uncertainty bounds via `statrs`.
//!
//! A confidence `p` backed by `n` evidence items is read as a Beta(1 + p·n,
//! 1 + (1 − p)·n) posterior over a uniform prior.

use statrs::distribution::{Beta, ContinuousCDF};

/// Probability mass inside the reported bounds.
pub const CREDIBLE_LEVEL: f64 = 0.95;

/// Posterior (alpha, beta) for confidence `p` over `n` observations.
pub fn posterior_params(p: f64, n: usize) -> (f64, f64) {
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.5 };
    let n = n as f64;
    (1.0 + p * n, 1.0 + (1.0 - p) * n)
}

/// Equal-tailed credible interval holding `level` mass.
///
/// Returns (0, 1) for parameters the distribution rejects.
pub fn credible_interval(alpha: f64, beta: f64, level: f64) -> (f64, f64) {
    if alpha <= 0.0 || beta <= 0.0 || !alpha.is_finite() || !beta.is_finite() {
        return (0.0, 1.0);
    }
    if alpha > 1e6 || beta > 1e6 {
        let mean = alpha / (alpha + beta);
        return ((mean - 1e-6).max(0.0), (mean + 1e-6).min(1.0));
    }

    let tail = (1.0 - level.clamp(0.0, 1.0)) / 2.0;
    match Beta::new(alpha, beta) {
        Ok(dist) => {
            let low = dist.inverse_cdf(tail);
            let high = dist.inverse_cdf(1.0 - tail);
            let low = if low.is_finite() { low.clamp(0.0, 1.0) } else { 0.0 };
            let high = if high.is_finite() { high.clamp(0.0, 1.0) } else { 1.0 };
            (low, high)
        }
        Err(_) => (0.0, 1.0),
    }
}

/// Bounds for a confidence backed by `evidence_count` items.
pub fn confidence_bounds(confidence: f64, evidence_count: usize) -> (f64, f64) {
    let (a, b) = posterior_params(confidence, evidence_count);
    credible_interval(a, b, CREDIBLE_LEVEL)
}
