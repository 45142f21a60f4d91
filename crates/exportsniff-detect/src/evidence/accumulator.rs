//! Per-format evidence tallies and the metrics derived from them.

use exportsniff_core::errors::ScoringError;
use exportsniff_core::types::collections::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::formats::SupportedFormat;

use super::types::{EvidenceItem, EvidenceWeight};

/// Normalized metrics consumed by every confidence scorer.
///
/// Ratio fields are clamped to [0, 1] on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetrics {
    completeness: f64,
    quality: f64,
    uniqueness: f64,
    evidence_count: usize,
    unique_count: usize,
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl EvidenceMetrics {
    pub fn new(
        completeness: f64,
        quality: f64,
        uniqueness: f64,
        evidence_count: usize,
        unique_count: usize,
    ) -> Self {
        debug_assert!(unique_count <= evidence_count, "unique items exceed total items");
        Self {
            completeness: clamp_unit(completeness),
            quality: clamp_unit(quality),
            uniqueness: clamp_unit(uniqueness),
            evidence_count,
            unique_count: unique_count.min(evidence_count),
        }
    }

    /// Metrics for a profile with no evidence.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0, 0)
    }

    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn uniqueness(&self) -> f64 {
        self.uniqueness
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence_count
    }

    pub fn unique_count(&self) -> usize {
        self.unique_count
    }

    /// Reject metrics that cannot have come through [`EvidenceMetrics::new`],
    /// e.g. deserialized from an untrusted source.
    pub fn validate(&self) -> Result<(), ScoringError> {
        for (field, v) in [
            ("completeness", self.completeness),
            ("quality", self.quality),
            ("uniqueness", self.uniqueness),
        ] {
            if !v.is_finite() {
                return Err(ScoringError::NonFiniteMetric {
                    field: field.to_string(),
                });
            }
            if !(0.0..=1.0).contains(&v) {
                return Err(ScoringError::InvalidParameters {
                    field: field.to_string(),
                    message: format!("{v} is outside [0, 1]"),
                });
            }
        }
        if self.unique_count > self.evidence_count {
            return Err(ScoringError::InvalidParameters {
                field: "unique_count".to_string(),
                message: format!(
                    "{} unique items but only {} items",
                    self.unique_count, self.evidence_count
                ),
            });
        }
        Ok(())
    }
}

/// Running evidence tallies for one format in one detection call.
#[derive(Debug, Clone, Default)]
pub struct EvidenceProfile {
    items: Vec<EvidenceItem>,
    tier_counts: [usize; 5],
    confidence_sum: f64,
    observed_weight: f64,
    total_possible_weight: f64,
}

impl EvidenceProfile {
    pub fn new(total_possible_weight: f64) -> Self {
        Self {
            total_possible_weight: total_possible_weight.max(0.0),
            ..Self::default()
        }
    }

    pub fn add(&mut self, item: EvidenceItem) {
        self.tier_counts[item.weight.index()] += 1;
        self.confidence_sum += item.confidence;
        self.observed_weight += item.weight.value();
        self.items.push(item);
    }

    pub fn set_total_possible_weight(&mut self, weight: f64) {
        self.total_possible_weight = weight.max(0.0);
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, tier: EvidenceWeight) -> usize {
        self.tier_counts[tier.index()]
    }

    pub fn observed_weight(&self) -> f64 {
        self.observed_weight
    }

    pub fn total_possible_weight(&self) -> f64 {
        self.total_possible_weight
    }

    /// Derive completeness, quality and uniqueness.
    pub fn metrics(&self) -> EvidenceMetrics {
        let n = self.items.len();
        let completeness = if self.total_possible_weight > 0.0 {
            self.observed_weight / self.total_possible_weight
        } else {
            0.0
        };
        let (quality, uniqueness) = if n == 0 {
            (0.0, 0.0)
        } else {
            (
                self.confidence_sum / n as f64,
                self.count(EvidenceWeight::Unique) as f64 / n as f64,
            )
        };
        EvidenceMetrics::new(
            completeness,
            quality,
            uniqueness,
            n,
            self.count(EvidenceWeight::Unique),
        )
    }

    /// Raw score projection used by the confidence calculator.
    pub fn score(&self, format: SupportedFormat) -> FormatScore {
        FormatScore {
            format,
            raw: self.items.iter().map(EvidenceItem::score).sum(),
            unique_hits: self.count(EvidenceWeight::Unique),
            strong_hits: self.count(EvidenceWeight::Strong),
        }
    }
}

/// Raw evidence score of one candidate format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatScore {
    pub format: SupportedFormat,
    /// Sum of weight × confidence over the format's evidence.
    pub raw: f64,
    pub unique_hits: usize,
    pub strong_hits: usize,
}

impl FormatScore {
    pub fn empty(format: SupportedFormat) -> Self {
        Self {
            format,
            raw: 0.0,
            unique_hits: 0,
            strong_hits: 0,
        }
    }

    /// Raw score discounted by the format's priority multiplier.
    pub fn weighted(&self) -> f64 {
        self.raw * self.format.priority_multiplier()
    }
}

/// Keyed collection of per-format profiles.
///
/// Parallel scoring gives each worker its own profile and merges the
/// finished profiles here; nothing is shared while evidence is added.
#[derive(Debug, Default)]
pub struct EvidenceAccumulator {
    profiles: FxHashMap<SupportedFormat, EvidenceProfile>,
}

impl EvidenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_evidence(&mut self, format: SupportedFormat, item: EvidenceItem) {
        self.profiles.entry(format).or_default().add(item);
    }

    pub fn set_total_possible_weight(&mut self, format: SupportedFormat, weight: f64) {
        self.profiles
            .entry(format)
            .or_default()
            .set_total_possible_weight(weight);
    }

    pub fn insert_profile(&mut self, format: SupportedFormat, profile: EvidenceProfile) {
        self.profiles.insert(format, profile);
    }

    pub fn profile(&self, format: SupportedFormat) -> Option<&EvidenceProfile> {
        self.profiles.get(&format)
    }

    /// Metrics for `format`; empty metrics if nothing was recorded.
    pub fn metrics(&self, format: SupportedFormat) -> EvidenceMetrics {
        self.profiles
            .get(&format)
            .map(EvidenceProfile::metrics)
            .unwrap_or_else(EvidenceMetrics::empty)
    }

    /// Scores for every format in `formats`, in the given order.
    pub fn scores(&self, formats: &[SupportedFormat]) -> Vec<FormatScore> {
        formats
            .iter()
            .map(|&f| {
                self.profiles
                    .get(&f)
                    .map(|p| p.score(f))
                    .unwrap_or_else(|| FormatScore::empty(f))
            })
            .collect()
    }
}
