//! FormatRegistry: the immutable catalog of format definitions.

use std::sync::Arc;

use exportsniff_core::errors::DetectionError;
use exportsniff_core::types::collections::FxHashSet;
use serde::Serialize;

use super::definitions;
use super::types::{FormatDefinition, SupportedFormat};

/// Diagnostic summary of one registered format.
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    pub format: SupportedFormat,
    pub display_name: &'static str,
    pub unique_indicators: usize,
    pub strong_indicators: usize,
    pub moderate_indicators: usize,
    pub weak_indicators: usize,
    pub pattern_count: usize,
    pub required_keys: Vec<String>,
    pub total_possible_weight: f64,
}

/// Catalog of format definitions, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    definitions: Arc<Vec<FormatDefinition>>,
}

impl FormatRegistry {
    /// Registry holding the built-in definitions.
    pub fn builtin() -> Self {
        Self {
            definitions: Arc::new(definitions::builtin_definitions()),
        }
    }

    /// Registry from caller-supplied definitions. Each definition is
    /// validated and a format may be defined only once.
    pub fn with_definitions(defs: Vec<FormatDefinition>) -> Result<Self, DetectionError> {
        let mut seen = FxHashSet::default();
        for def in &defs {
            def.validate()?;
            if !seen.insert(def.format) {
                return Err(DetectionError::InvalidFormatDefinition {
                    format: def.format.name().to_string(),
                    message: "format defined more than once".to_string(),
                });
            }
        }
        Ok(Self {
            definitions: Arc::new(defs),
        })
    }

    /// Definition for `format`, if registered.
    pub fn definition(&self, format: SupportedFormat) -> Option<&FormatDefinition> {
        self.definitions.iter().find(|d| d.format == format)
    }

    /// All definitions in registration order.
    pub fn definitions(&self) -> &[FormatDefinition] {
        &self.definitions
    }

    /// Registered formats in registration order.
    pub fn formats(&self) -> impl Iterator<Item = SupportedFormat> + '_ {
        self.definitions.iter().map(|d| d.format)
    }

    /// Every format a caller may see, including UNKNOWN.
    pub fn supported_formats(&self) -> Vec<SupportedFormat> {
        let mut formats: Vec<SupportedFormat> = self.formats().collect();
        formats.push(SupportedFormat::Unknown);
        formats
    }

    /// Summary of a registered format.
    pub fn format_info(&self, format: SupportedFormat) -> Option<FormatInfo> {
        let def = self.definition(format)?;
        Some(FormatInfo {
            format,
            display_name: format.display_name(),
            unique_indicators: def.unique.len(),
            strong_indicators: def.strong.len(),
            moderate_indicators: def.moderate.len(),
            weak_indicators: def.weak.len(),
            pattern_count: def.pattern_count(),
            required_keys: def.required_keys().map(str::to_string).collect(),
            total_possible_weight: def.total_possible_weight(),
        })
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::types::FieldIndicator;

    #[test]
    fn test_builtin_registry_has_five_formats() {
        let registry = FormatRegistry::builtin();
        assert_eq!(registry.formats().count(), 5);
        assert!(registry.definition(SupportedFormat::Unknown).is_none());
        assert_eq!(registry.supported_formats().last(), Some(&SupportedFormat::Unknown));
    }

    #[test]
    fn test_duplicate_format_rejected() {
        let defs = vec![definitions::zephyr(), definitions::zephyr()];
        assert!(FormatRegistry::with_definitions(defs).is_err());
    }

    #[test]
    fn test_tier_collision_rejected() {
        let mut def = definitions::testrail();
        def.weak.push(FieldIndicator::new("suite_id"));
        assert!(FormatRegistry::with_definitions(vec![def]).is_err());
    }

    #[test]
    fn test_format_info() {
        let info = FormatRegistry::builtin()
            .format_info(SupportedFormat::JiraXray)
            .unwrap();
        assert_eq!(info.required_keys, vec!["testExecutions", "testInfo", "evidences"]);
        assert_eq!(info.pattern_count, 1);
        assert!(info.total_possible_weight > 0.0);
    }
}
