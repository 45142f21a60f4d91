//! Detection configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Confidence model used by the full detection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerStrategy {
    /// Log-Bayes-factor accumulation with log-sum-exp normalization.
    LogBayes,
    /// Constrained nonlinear model fit by least squares.
    Mvlp,
    /// Nonlinear likelihood combined through Bayes' rule.
    WeightedEvidence,
}

impl ScorerStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LogBayes => "log_bayes",
            Self::Mvlp => "mvlp",
            Self::WeightedEvidence => "weighted_evidence",
        }
    }
}

impl fmt::Display for ScorerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScorerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log_bayes" | "log-bayes" => Ok(Self::LogBayes),
            "mvlp" => Ok(Self::Mvlp),
            "weighted_evidence" | "weighted-evidence" => Ok(Self::WeightedEvidence),
            other => Err(format!("unknown scorer strategy '{other}'")),
        }
    }
}

/// Configuration for the detection pipeline and its circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectionConfig {
    /// Consecutive pipeline failures before the circuit opens. Default: 5.
    pub circuit_failure_threshold: Option<u32>,
    /// Cooldown window for an open circuit, in seconds. Default: 30.
    pub circuit_cooldown_secs: Option<u64>,
    /// Top-level strong indicators required by the fast path. Default: 2.
    pub fast_path_threshold: Option<usize>,
    /// Minimum weighted evidence score for a full detection. Default: 3.0.
    pub min_detection_score: Option<f64>,
    /// Minimum scorer confidence for a full detection. Default: 0.15.
    pub min_detection_confidence: Option<f64>,
    /// Wall-clock floor per detection, in milliseconds. Default: 50.
    pub min_detection_time_ms: Option<u64>,
    /// Confidence scorer strategy. Default: weighted_evidence.
    pub scorer: Option<ScorerStrategy>,
}

impl DetectionConfig {
    /// Returns the effective failure threshold, defaulting to 5.
    pub fn effective_circuit_failure_threshold(&self) -> u32 {
        self.circuit_failure_threshold
            .unwrap_or(constants::DEFAULT_CIRCUIT_FAILURE_THRESHOLD)
    }

    /// Returns the effective cooldown window, defaulting to 30 seconds.
    pub fn effective_circuit_cooldown(&self) -> Duration {
        Duration::from_secs(
            self.circuit_cooldown_secs
                .unwrap_or(constants::DEFAULT_CIRCUIT_COOLDOWN_SECS),
        )
    }

    /// Returns the effective fast-path threshold, defaulting to 2.
    pub fn effective_fast_path_threshold(&self) -> usize {
        self.fast_path_threshold
            .unwrap_or(constants::DEFAULT_FAST_PATH_THRESHOLD)
    }

    /// Returns the effective minimum detection score, defaulting to 3.0.
    pub fn effective_min_detection_score(&self) -> f64 {
        self.min_detection_score
            .unwrap_or(constants::DEFAULT_MIN_DETECTION_SCORE)
    }

    /// Returns the effective minimum detection confidence, defaulting to 0.15.
    pub fn effective_min_detection_confidence(&self) -> f64 {
        self.min_detection_confidence
            .unwrap_or(constants::DEFAULT_MIN_DETECTION_CONFIDENCE)
    }

    /// Returns the effective detection time floor, defaulting to 50ms.
    pub fn effective_min_detection_time(&self) -> Duration {
        Duration::from_millis(
            self.min_detection_time_ms
                .unwrap_or(constants::DEFAULT_MIN_DETECTION_TIME_MS),
        )
    }

    /// Returns the effective scorer strategy, defaulting to weighted evidence.
    pub fn effective_scorer(&self) -> ScorerStrategy {
        self.scorer.unwrap_or(ScorerStrategy::WeightedEvidence)
    }
}
