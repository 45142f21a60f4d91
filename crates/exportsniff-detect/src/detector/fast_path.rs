//! Shortcut for inputs whose top-level keys name a format outright.

use exportsniff_core::types::collections::FxHashSet;
use serde_json::{Map, Value};

use crate::formats::{FormatRegistry, SupportedFormat};

/// Per-format sets of unique-tier names, lower-cased.
#[derive(Debug, Clone)]
pub struct FastPathTable {
    entries: Vec<(SupportedFormat, Vec<String>)>,
    threshold: usize,
}

impl FastPathTable {
    pub fn new(registry: &FormatRegistry, threshold: usize) -> Self {
        let entries = registry
            .definitions()
            .iter()
            .filter(|d| !d.unique.is_empty())
            .map(|d| {
                (
                    d.format,
                    d.unique.iter().map(|f| f.name.to_lowercase()).collect(),
                )
            })
            .collect();
        Self {
            entries,
            threshold: threshold.max(1),
        }
    }

    /// Format with the most top-level hits, if it reaches the threshold.
    /// Ties go to the earlier registered format.
    pub fn check(&self, object: &Map<String, Value>) -> Option<SupportedFormat> {
        let top: FxHashSet<String> = object.keys().map(|k| k.to_lowercase()).collect();
        let mut best: Option<(SupportedFormat, usize)> = None;
        for (format, names) in &self.entries {
            let hits = names.iter().filter(|n| top.contains(*n)).count();
            if hits >= self.threshold && best.map_or(true, |(_, h)| hits > h) {
                best = Some((*format, hits));
            }
        }
        best.map(|(f, _)| f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: Value) -> Option<SupportedFormat> {
        let table = FastPathTable::new(&FormatRegistry::builtin(), 2);
        table.check(value.as_object().unwrap())
    }

    #[test]
    fn test_two_unique_keys_hit() {
        assert_eq!(
            check(json!({"testCase": {}, "execution": {"status": "PASSED"}})),
            Some(SupportedFormat::Zephyr)
        );
        assert_eq!(
            check(json!({"TestExecutions": [], "testInfo": {}})),
            Some(SupportedFormat::JiraXray)
        );
    }

    #[test]
    fn test_nested_keys_do_not_count() {
        assert_eq!(check(json!({"wrapper": {"testCase": {}, "cycle": {}}})), None);
        assert_eq!(check(json!({"suite_id": 1})), None);
    }
}
