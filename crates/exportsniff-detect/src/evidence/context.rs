//! Context-sensitive weighting of a matched indicator.
//!
//! The substring scan only says a name occurs somewhere. The key index says
//! where: top-level keys keep their tier, deeply nested keys lose one tier,
//! and names that never occur as a whole key count as weak.

use super::sample::KeyIndex;
use super::types::EvidenceWeight;

/// Confidence for a key found at the top level.
pub const TOP_LEVEL_CONFIDENCE: f64 = 0.95;
/// Confidence for a key one object below the top level.
pub const NESTED_CONFIDENCE: f64 = 0.85;
/// Confidence for a key two or more objects deep.
pub const DEEP_CONFIDENCE: f64 = 0.70;
/// Confidence for a name that never occurs as a key.
pub const VALUE_ONLY_CONFIDENCE: f64 = 0.30;

pub struct ContextSearcher;

impl ContextSearcher {
    /// Weight and confidence for `lowered_name` declared at `tier`.
    pub fn evaluate(keys: &KeyIndex, lowered_name: &str, tier: EvidenceWeight) -> (EvidenceWeight, f64) {
        match keys.get(lowered_name) {
            Some(ctx) if ctx.min_depth == 0 => (tier, TOP_LEVEL_CONFIDENCE),
            Some(ctx) if ctx.min_depth == 1 => (tier, NESTED_CONFIDENCE),
            Some(_) => (tier.downgrade(), DEEP_CONFIDENCE),
            None => (EvidenceWeight::Weak.min(tier), VALUE_ONLY_CONFIDENCE),
        }
    }

    /// Human-readable location for evidence details.
    pub fn describe(keys: &KeyIndex, lowered_name: &str) -> String {
        match keys.get(lowered_name) {
            Some(ctx) => format!("at depth {}", ctx.min_depth),
            None => "inside a longer key or a value".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_depth_bands() {
        let keys = KeyIndex::build(&json!({
            "cycle": {"execution": {"testCase": {}}},
            "note": "mentions \"evidences\""
        }));
        assert_eq!(
            ContextSearcher::evaluate(&keys, "cycle", EvidenceWeight::Unique),
            (EvidenceWeight::Unique, TOP_LEVEL_CONFIDENCE)
        );
        assert_eq!(
            ContextSearcher::evaluate(&keys, "execution", EvidenceWeight::Unique),
            (EvidenceWeight::Unique, NESTED_CONFIDENCE)
        );
        assert_eq!(
            ContextSearcher::evaluate(&keys, "testcase", EvidenceWeight::Unique),
            (EvidenceWeight::Strong, DEEP_CONFIDENCE)
        );
        assert_eq!(
            ContextSearcher::evaluate(&keys, "evidences", EvidenceWeight::Unique),
            (EvidenceWeight::Weak, VALUE_ONLY_CONFIDENCE)
        );
    }

    #[test]
    fn test_context_never_upgrades() {
        let keys = KeyIndex::build(&json!({"key": 1}));
        let (weight, _) = ContextSearcher::evaluate(&keys, "missing", EvidenceWeight::None);
        assert_eq!(weight, EvidenceWeight::None);
    }
}
