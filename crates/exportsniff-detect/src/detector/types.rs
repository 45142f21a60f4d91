//! Detector outcome, report, and counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::bayesian::PosteriorDistribution;
use crate::complexity::ComplexityAssessment;
use crate::evidence::EvidenceSummary;
use crate::formats::SupportedFormat;

/// Which branch of the pipeline produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPath {
    /// Not a non-empty object.
    Rejected,
    Cached,
    /// Circuit open; top-level quick scoring only.
    CircuitFallback,
    /// Complexity gate fired; top-level quick scoring only.
    QuickPath,
    FastPath,
    FullScoring,
    /// The pipeline errored or panicked.
    Failed,
}

impl DetectionPath {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::Cached => "cached",
            Self::CircuitFallback => "circuit_fallback",
            Self::QuickPath => "quick_path",
            Self::FastPath => "fast_path",
            Self::FullScoring => "full_scoring",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DetectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectionOutcome {
    pub format: SupportedFormat,
    pub path: DetectionPath,
}

impl DetectionOutcome {
    pub fn new(format: SupportedFormat, path: DetectionPath) -> Self {
        Self { format, path }
    }

    pub(crate) fn unknown(path: DetectionPath) -> Self {
        Self::new(SupportedFormat::Unknown, path)
    }
}

/// Bronze-layer record attached to an ingested document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionMetadata {
    pub format: SupportedFormat,
    pub confidence: f64,
    pub path: DetectionPath,
    /// xxh3 of the compact serialized input, hex.
    pub content_hash: String,
    pub evidence_count: usize,
    pub scorer: &'static str,
    pub detected_at_unix_ms: u64,
}

/// Full diagnostic view of one detection.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub outcome: DetectionOutcome,
    /// Penalized confidence of every registered format, in registry order.
    pub confidences: Vec<(SupportedFormat, f64)>,
    /// Evidence supporting the detected format.
    pub evidence: Vec<EvidenceSummary>,
    pub posterior: PosteriorDistribution,
    pub complexity: Option<ComplexityAssessment>,
    pub metadata: DetectionMetadata,
}

impl DetectionReport {
    pub fn confidence(&self, format: SupportedFormat) -> f64 {
        self.confidences
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }
}

/// Per-path counters, updated lock-free.
#[derive(Debug, Default)]
pub struct DetectorStats {
    rejected: AtomicU64,
    cached: AtomicU64,
    circuit_fallback: AtomicU64,
    quick_path: AtomicU64,
    fast_path: AtomicU64,
    full_scoring: AtomicU64,
    failed: AtomicU64,
    evidence_passes: AtomicU64,
}

impl DetectorStats {
    pub(crate) fn record(&self, path: DetectionPath) {
        let counter = match path {
            DetectionPath::Rejected => &self.rejected,
            DetectionPath::Cached => &self.cached,
            DetectionPath::CircuitFallback => &self.circuit_fallback,
            DetectionPath::QuickPath => &self.quick_path,
            DetectionPath::FastPath => &self.fast_path,
            DetectionPath::FullScoring => &self.full_scoring,
            DetectionPath::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evidence_pass(&self) {
        self.evidence_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DetectorStatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DetectorStatsSnapshot {
            rejected: get(&self.rejected),
            cached: get(&self.cached),
            circuit_fallback: get(&self.circuit_fallback),
            quick_path: get(&self.quick_path),
            fast_path: get(&self.fast_path),
            full_scoring: get(&self.full_scoring),
            failed: get(&self.failed),
            evidence_passes: get(&self.evidence_passes),
        }
    }
}

/// Point-in-time copy of [`DetectorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectorStatsSnapshot {
    pub rejected: u64,
    pub cached: u64,
    pub circuit_fallback: u64,
    pub quick_path: u64,
    pub fast_path: u64,
    pub full_scoring: u64,
    pub failed: u64,
    /// Full evidence collections run by detection (not by confidence or
    /// report calls).
    pub evidence_passes: u64,
}

impl DetectorStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.rejected
            + self.cached
            + self.circuit_fallback
            + self.quick_path
            + self.fast_path
            + self.full_scoring
            + self.failed
    }
}
