//! Quick relative scoring over top-level keys only.
//!
//! Used for inputs the complexity gate rejects and while the circuit is
//! open. No serialization scan and no scorer call.

use exportsniff_core::types::collections::{FxHashMap, SmallVec4};
use serde_json::{Map, Value};

use crate::evidence::EvidenceWeight;
use crate::formats::{FormatRegistry, SupportedFormat};

#[derive(Debug, Clone)]
pub struct QuickScorer {
    /// Lower-cased indicator name to (format, tier) for every definition.
    indicators: FxHashMap<String, SmallVec4<(SupportedFormat, EvidenceWeight)>>,
    formats: Vec<SupportedFormat>,
    min_score: f64,
}

impl QuickScorer {
    pub fn new(registry: &FormatRegistry, min_score: f64) -> Self {
        let mut indicators: FxHashMap<String, SmallVec4<(SupportedFormat, EvidenceWeight)>> =
            FxHashMap::default();
        for def in registry.definitions() {
            for (tier, fields) in def.tiers() {
                for field in fields {
                    indicators
                        .entry(field.name.to_lowercase())
                        .or_default()
                        .push((def.format, tier));
                }
            }
        }
        Self {
            indicators,
            formats: registry.formats().collect(),
            min_score,
        }
    }

    /// Weighted score per registered format, in registry order.
    pub fn scores(&self, object: &Map<String, Value>) -> Vec<(SupportedFormat, f64)> {
        let mut totals: Vec<(SupportedFormat, f64)> = self.formats.iter().map(|f| (*f, 0.0)).collect();
        for key in object.keys() {
            let Some(hits) = self.indicators.get(&key.to_lowercase()) else {
                continue;
            };
            for (format, tier) in hits {
                if let Some(slot) = totals.iter_mut().find(|(f, _)| f == format) {
                    slot.1 += tier.value();
                }
            }
        }
        for (format, score) in &mut totals {
            *score *= format.priority_multiplier();
        }
        totals
    }

    /// Best-scoring format, or UNKNOWN when nothing reaches the minimum.
    pub fn detect(&self, object: &Map<String, Value>) -> SupportedFormat {
        let mut best = (SupportedFormat::Unknown, 0.0);
        for (format, score) in self.scores(object) {
            if score > best.1 {
                best = (format, score);
            }
        }
        if best.1 >= self.min_score {
            best.0
        } else {
            SupportedFormat::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quick() -> QuickScorer {
        QuickScorer::new(&FormatRegistry::builtin(), 3.0)
    }

    #[test]
    fn test_top_level_keys_decide() {
        let v = json!({"suite_id": 1, "cases": [], "title": "Regression"});
        assert_eq!(quick().detect(v.as_object().unwrap()), SupportedFormat::TestRail);
    }

    #[test]
    fn test_below_minimum_is_unknown() {
        let v = json!({"owner": "qa", "unrelated": true});
        assert_eq!(quick().detect(v.as_object().unwrap()), SupportedFormat::Unknown);
    }

    #[test]
    fn test_generic_discounted() {
        let v = json!({"tests": [], "name": "suite"});
        let scores = quick().scores(v.as_object().unwrap());
        let generic = scores.iter().find(|(f, _)| *f == SupportedFormat::Generic).unwrap().1;
        assert!((generic - (3.0 + 2.0) * 0.8).abs() < 1e-12);
    }
}
