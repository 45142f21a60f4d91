//! Format catalog types.

use std::fmt;
use std::str::FromStr;

use exportsniff_core::errors::DetectionError;
use exportsniff_core::types::collections::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::evidence::types::EvidenceWeight;

/// Test-management export formats the detector can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedFormat {
    Zephyr,
    JiraXray,
    TestRail,
    TestLink,
    Generic,
    Unknown,
}

impl SupportedFormat {
    /// Every variant, in the fixed order used for deterministic tie-breaking.
    pub const ALL: [SupportedFormat; 6] = [
        Self::Zephyr,
        Self::JiraXray,
        Self::TestRail,
        Self::TestLink,
        Self::Generic,
        Self::Unknown,
    ];

    /// Variants that carry a format definition.
    pub const DETECTABLE: [SupportedFormat; 5] = [
        Self::Zephyr,
        Self::JiraXray,
        Self::TestRail,
        Self::TestLink,
        Self::Generic,
    ];

    /// Stable machine name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zephyr => "zephyr",
            Self::JiraXray => "jira_xray",
            Self::TestRail => "testrail",
            Self::TestLink => "testlink",
            Self::Generic => "generic",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Zephyr => "Zephyr",
            Self::JiraXray => "JIRA/Xray",
            Self::TestRail => "TestRail",
            Self::TestLink => "TestLink",
            Self::Generic => "Generic",
            Self::Unknown => "Unknown",
        }
    }

    /// Multiplier applied to raw evidence scores before ranking.
    /// Catch-all formats are discounted so they lose ties.
    pub fn priority_multiplier(&self) -> f64 {
        match self {
            Self::Generic => 0.8,
            Self::Unknown => 0.6,
            _ => 1.0,
        }
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SupportedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zephyr" => Ok(Self::Zephyr),
            "jira_xray" | "xray" | "jira/xray" => Ok(Self::JiraXray),
            "testrail" => Ok(Self::TestRail),
            "testlink" => Ok(Self::TestLink),
            "generic" => Ok(Self::Generic),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// One indicator field, optionally with a regex that must match the
/// serialized sample for extra evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIndicator {
    pub name: String,
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FieldIndicator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: None,
        }
    }

    pub fn with_pattern(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: Some(pattern.into()),
        }
    }
}

/// Tiered indicator lists for one format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDefinition {
    pub format: SupportedFormat,
    pub unique: Vec<FieldIndicator>,
    pub strong: Vec<FieldIndicator>,
    pub moderate: Vec<FieldIndicator>,
    pub weak: Vec<FieldIndicator>,
    /// Keywords whose presence excuses a catch-all format from the
    /// required-key penalty.
    #[serde(default)]
    pub alternative_keywords: Vec<String>,
}

impl FormatDefinition {
    /// The four tiers, strongest first.
    pub fn tiers(&self) -> [(EvidenceWeight, &[FieldIndicator]); 4] {
        [
            (EvidenceWeight::Unique, self.unique.as_slice()),
            (EvidenceWeight::Strong, self.strong.as_slice()),
            (EvidenceWeight::Moderate, self.moderate.as_slice()),
            (EvidenceWeight::Weak, self.weak.as_slice()),
        ]
    }

    /// Key names whose coverage drives the required-key penalty: the
    /// unique tier.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.unique.iter().map(|i| i.name.as_str())
    }

    /// Count of indicators that carry a regex.
    pub fn pattern_count(&self) -> usize {
        self.tiers()
            .iter()
            .flat_map(|(_, tier)| tier.iter())
            .filter(|i| i.pattern.as_deref().is_some_and(|p| !p.is_empty()))
            .count()
    }

    /// Sum of the weights every evidence item could contribute: one key
    /// item per indicator, one structure item per strong/moderate
    /// indicator, one pattern item per regex.
    pub fn total_possible_weight(&self) -> f64 {
        let mut total = 0.0;
        for (weight, tier) in self.tiers() {
            for indicator in tier {
                total += weight.value();
                if matches!(weight, EvidenceWeight::Strong | EvidenceWeight::Moderate) {
                    total += weight.value();
                }
                if indicator.pattern.as_deref().is_some_and(|p| !p.is_empty()) {
                    total += weight.value();
                }
            }
        }
        total
    }

    /// Reject a definition in which one field name (compared
    /// case-insensitively) appears in more than one tier, or twice in one.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.format == SupportedFormat::Unknown {
            return Err(DetectionError::InvalidFormatDefinition {
                format: self.format.name().to_string(),
                message: "UNKNOWN cannot carry indicators".to_string(),
            });
        }
        let mut seen: FxHashMap<String, EvidenceWeight> = FxHashMap::default();
        for (weight, tier) in self.tiers() {
            for indicator in tier {
                if indicator.name.trim().is_empty() {
                    return Err(DetectionError::InvalidFormatDefinition {
                        format: self.format.name().to_string(),
                        message: format!("empty indicator name in {weight} tier"),
                    });
                }
                let key = indicator.name.to_lowercase();
                if let Some(previous) = seen.insert(key, weight) {
                    return Err(DetectionError::InvalidFormatDefinition {
                        format: self.format.name().to_string(),
                        message: format!(
                            "field '{}' appears in both {previous} and {weight} tiers",
                            indicator.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
