//! Cheap structural checks that route pathological inputs away from full
//! evidence scoring.

use std::fmt;

use exportsniff_core::types::collections::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inputs longer than this (in chars) are too complex.
pub const MAX_SERIALIZED_CHARS: usize = 50_000;
/// Bracket depth limit, checked inside the scan window only.
pub const MAX_NESTING_DEPTH: usize = 25;
/// Depth is scanned over this many leading chars.
pub const DEPTH_SCAN_CHARS: usize = 5_000;
/// Upper bound on the `":` key-count estimate.
pub const MAX_ESTIMATED_KEYS: usize = 2_000;
/// Distinct-token ratio below which a large input counts as repetitive.
pub const MIN_TOKEN_UNIQUENESS: f64 = 0.1;
/// Uniqueness is only checked on inputs longer than this.
pub const UNIQUENESS_MIN_CHARS: usize = 10_000;

const QUICK_PATH_RECOMMENDATION: &str = "use quick relative scoring on top-level keys";

/// Which check flagged the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityReason {
    Size,
    Depth,
    KeyCount,
    Repetition,
    SerializationFailed,
}

impl fmt::Display for ComplexityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Size => "size",
            Self::Depth => "depth",
            Self::KeyCount => "key_count",
            Self::Repetition => "repetition",
            Self::SerializationFailed => "serialization_failed",
        })
    }
}

/// Measurements gathered before a check short-circuited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityStats {
    pub size_chars: usize,
    pub max_depth: Option<usize>,
    pub estimated_keys: Option<usize>,
    pub token_uniqueness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAssessment {
    pub too_complex: bool,
    pub reason: Option<ComplexityReason>,
    pub recommendation: Option<String>,
    pub stats: ComplexityStats,
}

impl ComplexityAssessment {
    fn simple(stats: ComplexityStats) -> Self {
        Self {
            too_complex: false,
            reason: None,
            recommendation: None,
            stats,
        }
    }

    fn flagged(reason: ComplexityReason, stats: ComplexityStats) -> Self {
        Self {
            too_complex: true,
            reason: Some(reason),
            recommendation: Some(QUICK_PATH_RECOMMENDATION.to_string()),
            stats,
        }
    }
}

pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    /// Assess a parsed document. Serialization failure counts as too complex.
    pub fn assess(value: &Value) -> ComplexityAssessment {
        match serde_json::to_string(value) {
            Ok(s) => Self::assess_serialized(&s),
            Err(e) => {
                tracing::debug!(error = %e, "serialization failed during complexity assessment");
                ComplexityAssessment::flagged(ComplexityReason::SerializationFailed, ComplexityStats::default())
            }
        }
    }

    /// Assess compact serialized JSON. Checks run in order and stop at the
    /// first that fires.
    pub fn assess_serialized(serialized: &str) -> ComplexityAssessment {
        let mut stats = ComplexityStats {
            size_chars: serialized.chars().count(),
            ..ComplexityStats::default()
        };
        if stats.size_chars > MAX_SERIALIZED_CHARS {
            return ComplexityAssessment::flagged(ComplexityReason::Size, stats);
        }

        let depth = nesting_depth(serialized, DEPTH_SCAN_CHARS);
        stats.max_depth = Some(depth);
        if depth > MAX_NESTING_DEPTH {
            return ComplexityAssessment::flagged(ComplexityReason::Depth, stats);
        }

        let keys = serialized.matches("\":").count();
        stats.estimated_keys = Some(keys);
        if keys > MAX_ESTIMATED_KEYS {
            return ComplexityAssessment::flagged(ComplexityReason::KeyCount, stats);
        }

        if stats.size_chars > UNIQUENESS_MIN_CHARS {
            let ratio = token_uniqueness(serialized);
            stats.token_uniqueness = Some(ratio);
            if ratio < MIN_TOKEN_UNIQUENESS {
                return ComplexityAssessment::flagged(ComplexityReason::Repetition, stats);
            }
        }

        ComplexityAssessment::simple(stats)
    }
}

/// Deepest bracket nesting within the first `window` chars, ignoring
/// brackets inside string literals.
fn nesting_depth(s: &str, window: usize) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars().take(window) {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Distinct alphanumeric tokens over total tokens. 1.0 for no tokens.
fn token_uniqueness(s: &str) -> f64 {
    let mut total = 0usize;
    let mut distinct = FxHashSet::default();
    for token in s
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
    {
        total += 1;
        distinct.insert(token);
    }
    if total == 0 {
        1.0
    } else {
        distinct.len() as f64 / total as f64
    }
}
