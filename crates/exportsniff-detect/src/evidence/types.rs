//! Evidence item types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an evidence item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// A unique- or strong-tier key was found.
    RequiredKey,
    /// A moderate- or weak-tier key was found.
    OptionalKey,
    /// A strong- or moderate-tier key was found holding an object or array.
    StructureIndicator,
    /// An indicator's regex matched the sample.
    FieldPattern,
}

impl EvidenceSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequiredKey => "required_key",
            Self::OptionalKey => "optional_key",
            Self::StructureIndicator => "structure_indicator",
            Self::FieldPattern => "field_pattern",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Qualitative strength of an indicator: UNIQUE > STRONG > MODERATE > WEAK > NONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceWeight {
    None,
    Weak,
    Moderate,
    Strong,
    Unique,
}

impl EvidenceWeight {
    /// Numeric weight used in scores and completeness.
    pub fn value(&self) -> f64 {
        match self {
            Self::Unique => 5.0,
            Self::Strong => 3.0,
            Self::Moderate => 2.0,
            Self::Weak => 1.0,
            Self::None => 0.0,
        }
    }

    /// One tier weaker. WEAK and NONE stay where they are.
    pub fn downgrade(&self) -> Self {
        match self {
            Self::Unique => Self::Strong,
            Self::Strong => Self::Moderate,
            Self::Moderate | Self::Weak => Self::Weak,
            Self::None => Self::None,
        }
    }

    /// Index into per-tier tallies.
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Weak => 1,
            Self::Moderate => 2,
            Self::Strong => 3,
            Self::Unique => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
            Self::None => "none",
        }
    }
}

impl fmt::Display for EvidenceWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One observed signal supporting a candidate format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: EvidenceSource,
    pub weight: EvidenceWeight,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub details: String,
}

impl EvidenceItem {
    /// Create an item; confidence is clamped to [0, 1] (NaN becomes 0).
    pub fn new(
        source: EvidenceSource,
        weight: EvidenceWeight,
        confidence: f64,
        details: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            source,
            weight,
            confidence,
            details: details.into(),
        }
    }

    /// Contribution to a raw format score.
    pub fn score(&self) -> f64 {
        self.weight.value() * self.confidence
    }
}

/// Flattened evidence record for diagnostics and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub weight: String,
    pub confidence: f64,
}

impl From<&EvidenceItem> for EvidenceSummary {
    fn from(item: &EvidenceItem) -> Self {
        Self {
            kind: item.source.name().to_string(),
            description: item.details.clone(),
            weight: item.weight.name().to_string(),
            confidence: item.confidence,
        }
    }
}
