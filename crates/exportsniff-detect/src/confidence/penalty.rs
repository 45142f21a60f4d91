//! Partial required-key coverage penalty.

use serde::{Deserialize, Serialize};

use crate::evidence::KeyIndex;
use crate::formats::{FormatDefinition, SupportedFormat};

/// Exponent applied to the required-key coverage ratio.
pub const COVERAGE_EXPONENT: f64 = 1.5;

/// Multiplier for GENERIC when none of its alternative keywords is present.
pub const GENERIC_ABSENT_PENALTY: f64 = 0.01;

/// How many of a format's required keys occur in a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredKeyCoverage {
    pub matched: usize,
    pub total: usize,
    /// Whether any alternative keyword occurs as a key (GENERIC only).
    pub alternative_present: bool,
}

impl RequiredKeyCoverage {
    /// Measure coverage of `def` against the keys of a sample.
    /// Keys match case-insensitively at any depth.
    pub fn measure(def: &FormatDefinition, keys: &KeyIndex) -> Self {
        let mut matched = 0;
        let mut total = 0;
        for key in def.required_keys() {
            total += 1;
            if keys.contains(&key.to_lowercase()) {
                matched += 1;
            }
        }
        let alternative_present = def
            .alternative_keywords
            .iter()
            .any(|k| keys.contains(&k.to_lowercase()));
        Self {
            matched,
            total,
            alternative_present,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Multiplier in [0, 1] applied on top of the base confidence.
pub fn required_key_penalty(format: SupportedFormat, coverage: &RequiredKeyCoverage) -> f64 {
    if format == SupportedFormat::Generic {
        return if coverage.alternative_present {
            1.0
        } else {
            GENERIC_ABSENT_PENALTY
        };
    }
    if coverage.total == 0 {
        return 1.0;
    }
    coverage.ratio().powf(COVERAGE_EXPONENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::definitions;
    use serde_json::json;

    #[test]
    fn test_full_partial_and_zero_coverage() {
        let def = definitions::zephyr();
        let full = KeyIndex::build(&json!({"testCase": {}, "execution": {}, "cycle": {}}));
        let partial = KeyIndex::build(&json!({"testCase": {}, "other": 1}));
        let none = KeyIndex::build(&json!({"objective": "x", "priority": "High"}));

        let p = |k: &KeyIndex| required_key_penalty(SupportedFormat::Zephyr, &RequiredKeyCoverage::measure(&def, k));
        assert_eq!(p(&full), 1.0);
        assert!((p(&partial) - (1.0_f64 / 3.0).powf(1.5)).abs() < 1e-12);
        assert_eq!(p(&none), 0.0);
    }

    #[test]
    fn test_generic_needs_alternative_keyword() {
        let def = definitions::generic();
        let with = KeyIndex::build(&json!({"Tests": [{"name": "a"}]}));
        let without = KeyIndex::build(&json!({"name": "a", "steps": []}));
        let p = |k: &KeyIndex| required_key_penalty(SupportedFormat::Generic, &RequiredKeyCoverage::measure(&def, k));
        assert_eq!(p(&with), 1.0);
        assert_eq!(p(&without), GENERIC_ABSENT_PENALTY);
    }
}
