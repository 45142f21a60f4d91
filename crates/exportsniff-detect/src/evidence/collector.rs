//! EvidenceCollector: scans a sample for a format's indicators.
//!
//! Pattern tables are built once per registry. Each table carries one
//! Aho-Corasick automaton over the lower-cased indicator names so a sample
//! is scanned in a single pass per format. A hit is a plain substring hit;
//! the key index decides how much it is worth.

use aho_corasick::AhoCorasick;
use exportsniff_core::types::collections::{FxHashMap, FxHashSet};
use moka::sync::Cache;
use regex::{Regex, RegexBuilder};

use crate::formats::{FormatRegistry, SupportedFormat};

use super::context::ContextSearcher;
use super::sample::Sample;
use super::types::{EvidenceItem, EvidenceSource, EvidenceWeight};

/// Confidence of a matched field pattern.
pub const FIELD_PATTERN_CONFIDENCE: f64 = 0.90;

/// Compiled regexes kept across calls.
const REGEX_CACHE_CAPACITY: u64 = 256;

#[derive(Debug, Clone)]
struct Indicator {
    name: String,
    lowered: String,
    tier: EvidenceWeight,
    /// Index of the name in the table's automaton.
    needle: usize,
}

#[derive(Debug, Clone)]
struct FieldPattern {
    indicator: Indicator,
    pattern: String,
}

/// Indicator lookup table for one format.
#[derive(Debug)]
struct PatternTable {
    /// Unique + strong tier names.
    required_keys: Vec<Indicator>,
    /// Moderate + weak tier names.
    optional_keys: Vec<Indicator>,
    /// Strong + moderate tier names, credited again when holding a container.
    structure_indicators: Vec<Indicator>,
    field_patterns: Vec<FieldPattern>,
    matcher: Option<AhoCorasick>,
}

impl PatternTable {
    fn build(registry: &FormatRegistry, format: SupportedFormat) -> Option<Self> {
        let def = registry.definition(format)?;
        let mut needles: Vec<String> = Vec::new();
        let mut needle_ids: FxHashMap<String, usize> = FxHashMap::default();
        let mut table = PatternTable {
            required_keys: Vec::new(),
            optional_keys: Vec::new(),
            structure_indicators: Vec::new(),
            field_patterns: Vec::new(),
            matcher: None,
        };

        for (tier, fields) in def.tiers() {
            for field in fields {
                let lowered = field.name.to_lowercase();
                let needle = *needle_ids.entry(lowered.clone()).or_insert_with(|| {
                    needles.push(lowered.clone());
                    needles.len() - 1
                });
                let indicator = Indicator {
                    name: field.name.clone(),
                    lowered,
                    tier,
                    needle,
                };
                match tier {
                    EvidenceWeight::Unique | EvidenceWeight::Strong => {
                        table.required_keys.push(indicator.clone())
                    }
                    _ => table.optional_keys.push(indicator.clone()),
                }
                if matches!(tier, EvidenceWeight::Strong | EvidenceWeight::Moderate) {
                    table.structure_indicators.push(indicator.clone());
                }
                if let Some(pattern) = field.pattern.as_deref().filter(|p| !p.trim().is_empty()) {
                    table.field_patterns.push(FieldPattern {
                        indicator,
                        pattern: pattern.to_string(),
                    });
                }
            }
        }

        if !needles.is_empty() {
            match AhoCorasick::new(&needles) {
                Ok(ac) => table.matcher = Some(ac),
                Err(e) => {
                    tracing::warn!(format = %format, error = %e, "indicator automaton failed to build");
                }
            }
        }
        Some(table)
    }

    /// Needle indices present in the lower-cased sample.
    fn matched_needles(&self, lowered: &str) -> FxHashSet<usize> {
        match &self.matcher {
            Some(ac) => ac
                .find_overlapping_iter(lowered)
                .map(|m| m.pattern().as_usize())
                .collect(),
            None => FxHashSet::default(),
        }
    }
}

/// Collects evidence items for one format from one sample.
pub struct EvidenceCollector {
    tables: FxHashMap<SupportedFormat, PatternTable>,
    regex_cache: Cache<String, Option<Regex>>,
}

impl EvidenceCollector {
    /// Build pattern tables for every registered format.
    pub fn new(registry: &FormatRegistry) -> Self {
        let tables = registry
            .formats()
            .filter_map(|f| PatternTable::build(registry, f).map(|t| (f, t)))
            .collect();
        Self {
            tables,
            regex_cache: Cache::new(REGEX_CACHE_CAPACITY),
        }
    }

    /// Collect evidence for `format`. Returns the items and the sum of
    /// their weights. Unregistered formats yield no evidence.
    pub fn collect_evidence(&self, sample: &Sample, format: SupportedFormat) -> (Vec<EvidenceItem>, f64) {
        let Some(table) = self.tables.get(&format) else {
            return (Vec::new(), 0.0);
        };
        let matched = table.matched_needles(sample.lowered());
        if matched.is_empty() {
            return (Vec::new(), 0.0);
        }

        let keys = sample.keys();
        let mut items = Vec::new();

        for (source, indicators) in [
            (EvidenceSource::RequiredKey, &table.required_keys),
            (EvidenceSource::OptionalKey, &table.optional_keys),
        ] {
            for indicator in indicators.iter().filter(|i| matched.contains(&i.needle)) {
                let (weight, confidence) =
                    ContextSearcher::evaluate(keys, &indicator.lowered, indicator.tier);
                items.push(EvidenceItem::new(
                    source,
                    weight,
                    confidence,
                    format!(
                        "{} key '{}' found {}",
                        indicator.tier,
                        indicator.name,
                        ContextSearcher::describe(keys, &indicator.lowered)
                    ),
                ));
            }
        }

        for indicator in table
            .structure_indicators
            .iter()
            .filter(|i| matched.contains(&i.needle))
        {
            let holds_container = keys
                .get(&indicator.lowered)
                .is_some_and(|ctx| ctx.holds_container);
            if !holds_container {
                continue;
            }
            let (weight, confidence) =
                ContextSearcher::evaluate(keys, &indicator.lowered, indicator.tier);
            items.push(EvidenceItem::new(
                EvidenceSource::StructureIndicator,
                weight,
                confidence,
                format!("'{}' holds a nested structure", indicator.name),
            ));
        }

        for field in table
            .field_patterns
            .iter()
            .filter(|p| matched.contains(&p.indicator.needle))
        {
            let Some(regex) = self.compiled(&field.pattern) else {
                continue;
            };
            if regex.is_match(sample.original()) {
                items.push(EvidenceItem::new(
                    EvidenceSource::FieldPattern,
                    field.indicator.tier,
                    FIELD_PATTERN_CONFIDENCE,
                    format!("'{}' matches its expected pattern", field.indicator.name),
                ));
            }
        }

        let total = items.iter().map(|i| i.weight.value()).sum();
        (items, total)
    }

    /// Case-insensitive compiled regex, or `None` for a malformed pattern.
    fn compiled(&self, pattern: &str) -> Option<Regex> {
        self.regex_cache.get_with(pattern.to_string(), || {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::debug!(pattern, error = %e, "skipping malformed field pattern");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{FieldIndicator, FormatDefinition};
    use serde_json::json;

    fn sample(value: serde_json::Value) -> Sample {
        Sample::from_value(&value).unwrap()
    }

    #[test]
    fn test_zephyr_evidence() {
        let collector = EvidenceCollector::new(&FormatRegistry::builtin());
        let s = sample(json!({
            "testCase": {"name": "Login", "testCaseKey": "PROJ-T12"},
            "execution": {"status": "PASSED"},
            "cycle": {"id": 4}
        }));
        let (items, total) = collector.collect_evidence(&s, SupportedFormat::Zephyr);

        let unique: Vec<_> = items
            .iter()
            .filter(|i| i.source == EvidenceSource::RequiredKey && i.weight == EvidenceWeight::Unique)
            .collect();
        assert_eq!(unique.len(), 3);
        assert!(items.iter().any(|i| i.source == EvidenceSource::FieldPattern));
        let expected: f64 = items.iter().map(|i| i.weight.value()).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let collector = EvidenceCollector::new(&FormatRegistry::builtin());
        let s = sample(json!({"TESTEXECUTIONS": [], "TestInfo": {}}));
        let (items, _) = collector.collect_evidence(&s, SupportedFormat::JiraXray);
        assert_eq!(
            items
                .iter()
                .filter(|i| i.weight == EvidenceWeight::Unique)
                .count(),
            2
        );
    }

    #[test]
    fn test_name_inside_longer_key_counts_as_weak() {
        let collector = EvidenceCollector::new(&FormatRegistry::builtin());
        let s = sample(json!({"testCaseId": "X", "executionDate": "d", "cycleName": "c"}));
        let (items, total) = collector.collect_evidence(&s, SupportedFormat::Zephyr);

        let required: Vec<_> = items
            .iter()
            .filter(|i| i.source == EvidenceSource::RequiredKey)
            .collect();
        assert_eq!(required.len(), 3);
        for item in &required {
            assert_eq!(item.weight, EvidenceWeight::Weak);
            assert_eq!(item.confidence, crate::evidence::context::VALUE_ONLY_CONFIDENCE);
        }
        assert!(total > 0.0);
        assert!(items.iter().all(|i| i.weight != EvidenceWeight::Unique));
    }

    #[test]
    fn test_structure_indicator_requires_container() {
        let collector = EvidenceCollector::new(&FormatRegistry::builtin());
        let flat = sample(json!({"tests": "none"}));
        let nested = sample(json!({"tests": [{"name": "a"}]}));
        let has_structure = |s: &Sample| {
            collector
                .collect_evidence(s, SupportedFormat::Generic)
                .0
                .iter()
                .any(|i| i.source == EvidenceSource::StructureIndicator)
        };
        assert!(!has_structure(&flat));
        assert!(has_structure(&nested));
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let def = FormatDefinition {
            format: SupportedFormat::TestRail,
            unique: vec![FieldIndicator::with_pattern("suite_id", "([unclosed")],
            strong: Vec::new(),
            moderate: Vec::new(),
            weak: Vec::new(),
            alternative_keywords: Vec::new(),
        };
        let registry = FormatRegistry::with_definitions(vec![def]).unwrap();
        let collector = EvidenceCollector::new(&registry);
        let (items, _) = collector.collect_evidence(&sample(json!({"suite_id": 3})), SupportedFormat::TestRail);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, EvidenceSource::RequiredKey);
    }

    #[test]
    fn test_unregistered_format_yields_nothing() {
        let collector = EvidenceCollector::new(&FormatRegistry::builtin());
        let (items, total) =
            collector.collect_evidence(&sample(json!({"a": 1})), SupportedFormat::Unknown);
        assert!(items.is_empty());
        assert_eq!(total, 0.0);
    }
}
