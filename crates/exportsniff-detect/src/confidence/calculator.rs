//! Relative confidence from per-format raw scores.
//!
//! The calculator is stateless: a target's confidence depends only on the
//! score table it is handed and the fixed priority multipliers.

use crate::evidence::FormatScore;
use crate::formats::SupportedFormat;

/// Logistic input is clamped to this magnitude before `exp`.
const LOGISTIC_CLAMP: f64 = 50.0;

/// Score that saturates the evidence-magnitude factor to ~63%.
const EVIDENCE_SCALE: f64 = 4.0;

/// Competitor scores below this count as no competition.
const NEGLIGIBLE_COMPETITION: f64 = 0.5;

/// Minimum lead for the strong-indicator fallback.
const STRONG_GAP: f64 = 2.0;

const UNIQUE_FALLBACK: f64 = 0.75;
const STRONG_FALLBACK: f64 = 0.65;
const UNCONTESTED_FALLBACK: f64 = 0.55;

/// Numerically clamped logistic function.
pub fn logistic(x: f64) -> f64 {
    if x.is_nan() {
        return 0.5;
    }
    let x = x.clamp(-LOGISTIC_CLAMP, LOGISTIC_CLAMP);
    1.0 / (1.0 + (-x).exp())
}

/// Logistic temperature for a given top score. Lower is sharper.
pub fn temperature(top_score: f64) -> f64 {
    if top_score >= 10.0 {
        0.5
    } else if top_score >= 7.0 {
        0.65
    } else {
        0.8
    }
}

/// Caps confidence for weak absolute evidence, in [0, 1).
pub fn evidence_scale(score: f64) -> f64 {
    if score <= 0.0 || score.is_nan() {
        return 0.0;
    }
    1.0 - (-score / EVIDENCE_SCALE).exp()
}

/// Floor applied when the target is the top-scoring format.
pub fn baseline_floor(score: f64) -> f64 {
    if score >= 10.0 {
        0.90
    } else if score >= 7.0 {
        0.80
    } else if score >= 4.0 {
        0.65
    } else {
        (score.max(0.0) / 4.0) * 0.65
    }
}

pub struct ConfidenceCalculator;

impl ConfidenceCalculator {
    /// Confidence in [0, 1] that `target` is the format behind `scores`.
    ///
    /// Formats missing from `scores` count as zero. The target's own entry
    /// is excluded when finding its best competitor.
    pub fn confidence_for(target: SupportedFormat, scores: &[FormatScore]) -> f64 {
        let own = scores
            .iter()
            .find(|s| s.format == target)
            .copied()
            .unwrap_or_else(|| FormatScore::empty(target));
        let score = sanitize(own.weighted());
        if score <= 0.0 {
            return 0.0;
        }

        let competitor = scores
            .iter()
            .filter(|s| s.format != target)
            .map(|s| sanitize(s.weighted()))
            .fold(0.0_f64, f64::max);
        let top = score.max(competitor);
        let is_top = score >= competitor;
        let spread = score - competitor;

        let mut confidence = logistic(spread / temperature(top)) * evidence_scale(score);

        if is_top {
            confidence = confidence.max(baseline_floor(score));
        }
        if own.unique_hits > 0 && competitor < NEGLIGIBLE_COMPETITION {
            confidence = confidence.max(UNIQUE_FALLBACK);
        }
        if own.strong_hits > 0 && spread >= STRONG_GAP {
            confidence = confidence.max(STRONG_FALLBACK);
        }
        if competitor <= 0.0 {
            confidence = confidence.max(UNCONTESTED_FALLBACK);
        }

        confidence.clamp(0.0, 1.0)
    }

    /// Arg-max over weighted scores. Ties go to the earlier entry.
    pub fn top_format(scores: &[FormatScore]) -> Option<FormatScore> {
        scores.iter().copied().fold(None, |best, s| match best {
            Some(b) if sanitize(b.weighted()) >= sanitize(s.weighted()) => Some(b),
            _ => Some(s),
        })
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(format: SupportedFormat, raw: f64, unique: usize, strong: usize) -> FormatScore {
        FormatScore {
            format,
            raw,
            unique_hits: unique,
            strong_hits: strong,
        }
    }

    #[test]
    fn test_logistic_is_clamped() {
        assert_eq!(logistic(1e6), logistic(50.0));
        assert!(logistic(-1e6) > 0.0);
        assert_eq!(logistic(0.0), 0.5);
    }

    #[test]
    fn test_temperature_bands() {
        assert_eq!(temperature(12.0), 0.5);
        assert_eq!(temperature(7.0), 0.65);
        assert_eq!(temperature(3.0), 0.8);
    }

    #[test]
    fn test_decisive_winner_is_high_confidence() {
        let scores = [
            score(SupportedFormat::Zephyr, 14.0, 3, 0),
            score(SupportedFormat::TestLink, 5.0, 0, 1),
        ];
        let c = ConfidenceCalculator::confidence_for(SupportedFormat::Zephyr, &scores);
        assert!(c > 0.9, "confidence {c}");
        let loser = ConfidenceCalculator::confidence_for(SupportedFormat::TestLink, &scores);
        assert!(loser < 0.1, "confidence {loser}");
    }

    #[test]
    fn test_no_evidence_is_zero() {
        let scores = [score(SupportedFormat::Zephyr, 5.0, 1, 0)];
        assert_eq!(ConfidenceCalculator::confidence_for(SupportedFormat::TestRail, &scores), 0.0);
        assert_eq!(ConfidenceCalculator::confidence_for(SupportedFormat::Zephyr, &[]), 0.0);
    }

    #[test]
    fn test_weak_uncontested_evidence_hits_fallback() {
        let scores = [score(SupportedFormat::TestRail, 1.0, 0, 0)];
        let c = ConfidenceCalculator::confidence_for(SupportedFormat::TestRail, &scores);
        assert_eq!(c, UNCONTESTED_FALLBACK);
    }

    #[test]
    fn test_unique_evidence_fallback() {
        let scores = [
            score(SupportedFormat::JiraXray, 2.0, 1, 0),
            score(SupportedFormat::Zephyr, 0.3, 0, 0),
        ];
        let c = ConfidenceCalculator::confidence_for(SupportedFormat::JiraXray, &scores);
        assert!(c >= UNIQUE_FALLBACK);
    }

    #[test]
    fn test_generic_discounted_on_ties() {
        let scores = [
            score(SupportedFormat::TestRail, 5.0, 0, 1),
            score(SupportedFormat::Generic, 5.0, 0, 1),
        ];
        let top = ConfidenceCalculator::top_format(&scores).unwrap();
        assert_eq!(top.format, SupportedFormat::TestRail);
        assert!(
            ConfidenceCalculator::confidence_for(SupportedFormat::TestRail, &scores)
                > ConfidenceCalculator::confidence_for(SupportedFormat::Generic, &scores)
        );
    }

    #[test]
    fn test_non_finite_scores_are_ignored() {
        let scores = [
            score(SupportedFormat::Zephyr, f64::NAN, 0, 0),
            score(SupportedFormat::TestRail, f64::INFINITY, 0, 0),
        ];
        let c = ConfidenceCalculator::confidence_for(SupportedFormat::Zephyr, &scores);
        assert_eq!(c, 0.0);
    }
}
