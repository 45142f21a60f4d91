//! FormatDetector: the detection facade.
//!
//! ```text
//! reject non-object/empty ─▶ UNKNOWN
//! cache hit ─────────────────▶ cached format
//! circuit open ──────────────▶ quick scoring on top-level keys
//! ┌ pipeline (errors and panics caught) ───────────────────────────┐
//! │ complexity gate ─▶ quick scoring                               │
//! │ fast path ───────▶ ≥ threshold unique keys at top level        │
//! │ full scoring ────▶ parallel evidence per format, arg-max,      │
//! │                    scorer confidence, sufficiency bar          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `detect` call is padded to the configured minimum wall-clock time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use exportsniff_core::errors::{DetectionError, ExportSniffErrorCode};
use exportsniff_core::ExportSniffConfig;
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::bayesian::{build_scorer, ConfidenceScorer, LogBayesScorer, PosteriorDistribution};
use crate::cache::hasher::content_hash_hex;
use crate::cache::{enforce_min_detection_time, CacheStats, DetectionCache};
use crate::complexity::ComplexityAnalyzer;
use crate::confidence::{required_key_penalty, ConfidenceCalculator, RequiredKeyCoverage};
use crate::evidence::{
    EvidenceAccumulator, EvidenceCollector, EvidenceEvaluator, EvidenceItem, EvidenceProfile,
    EvidenceSummary, FormatScore, Sample,
};
use crate::formats::{FormatRegistry, SupportedFormat};

use super::circuit::{CircuitBreaker, CircuitState};
use super::fast_path::FastPathTable;
use super::quick::QuickScorer;
use super::types::{
    DetectionMetadata, DetectionOutcome, DetectionPath, DetectionReport, DetectorStats,
    DetectorStatsSnapshot,
};

/// Evidence of every registered format for one sample.
struct Analysis {
    accumulator: EvidenceAccumulator,
    scores: Vec<FormatScore>,
}

pub struct FormatDetector {
    registry: FormatRegistry,
    collector: EvidenceCollector,
    scorer: Box<dyn ConfidenceScorer>,
    posterior_model: LogBayesScorer,
    evaluator: EvidenceEvaluator,
    fast_path: FastPathTable,
    quick: QuickScorer,
    cache: DetectionCache,
    circuit: CircuitBreaker,
    stats: DetectorStats,
    min_detection_time: Duration,
    max_json_bytes: u64,
}

impl FormatDetector {
    /// Detector with the built-in formats and the configured scorer.
    pub fn new(config: &ExportSniffConfig) -> Self {
        let scorer = build_scorer(config.detection.effective_scorer());
        Self::with_registry(config, FormatRegistry::builtin(), scorer)
    }

    /// Detector with the built-in formats and a caller-supplied scorer.
    pub fn with_scorer(config: &ExportSniffConfig, scorer: Box<dyn ConfidenceScorer>) -> Self {
        Self::with_registry(config, FormatRegistry::builtin(), scorer)
    }

    pub fn with_registry(
        config: &ExportSniffConfig,
        registry: FormatRegistry,
        scorer: Box<dyn ConfidenceScorer>,
    ) -> Self {
        let detection = &config.detection;
        tracing::debug!(
            scorer = scorer.name(),
            formats = registry.definitions().len(),
            "building format detector"
        );
        Self {
            collector: EvidenceCollector::new(&registry),
            fast_path: FastPathTable::new(&registry, detection.effective_fast_path_threshold()),
            quick: QuickScorer::new(&registry, detection.effective_min_detection_score()),
            evaluator: EvidenceEvaluator::from_config(detection),
            cache: DetectionCache::from_config(&config.cache),
            circuit: CircuitBreaker::new(
                detection.effective_circuit_failure_threshold(),
                detection.effective_circuit_cooldown(),
            ),
            stats: DetectorStats::default(),
            min_detection_time: detection.effective_min_detection_time(),
            max_json_bytes: config.ingestion.effective_max_json_size_bytes(),
            posterior_model: LogBayesScorer::default(),
            scorer,
            registry,
        }
    }

    /// Detected format. Never fails; UNKNOWN means "could not classify".
    pub fn detect_format(&self, data: &Value) -> SupportedFormat {
        self.detect(data).format
    }

    /// Detected format and the pipeline branch that produced it.
    pub fn detect(&self, data: &Value) -> DetectionOutcome {
        let start = Instant::now();
        let outcome = self.detect_unpadded(data);
        enforce_min_detection_time(start, self.min_detection_time);
        self.stats.record(outcome.path);
        tracing::debug!(
            format = %outcome.format,
            path = %outcome.path,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "detection finished"
        );
        outcome
    }

    /// Parse raw JSON under the ingestion size limit, then detect.
    pub fn detect_from_str(&self, raw: &str) -> Result<DetectionOutcome, DetectionError> {
        let size = raw.len() as u64;
        if size > self.max_json_bytes {
            return Err(DetectionError::InputTooLarge {
                size_bytes: size,
                limit_bytes: self.max_json_bytes,
            });
        }
        let value: Value =
            serde_json::from_str(raw).map_err(|e| DetectionError::InvalidJson(e.to_string()))?;
        Ok(self.detect(&value))
    }

    fn detect_unpadded(&self, data: &Value) -> DetectionOutcome {
        let Some(object) = non_empty_object(data) else {
            return DetectionOutcome::unknown(DetectionPath::Rejected);
        };
        let serialized = match serde_json::to_string(data) {
            Ok(s) => Arc::<str>::from(s),
            Err(e) => {
                return self.fail(DetectionError::Serialization(e.to_string()));
            }
        };

        if let Some(format) = self.cache.get_result(&serialized) {
            self.circuit.record_success();
            return DetectionOutcome::new(format, DetectionPath::Cached);
        }

        if self.circuit.is_open() {
            return DetectionOutcome::new(self.quick.detect(object), DetectionPath::CircuitFallback);
        }

        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_pipeline(data, object, Arc::clone(&serialized))
        }));
        match run {
            Ok(Ok(outcome)) => {
                self.cache.put_result(serialized, outcome.format);
                self.circuit.record_success();
                outcome
            }
            Ok(Err(e)) => self.fail(e),
            Err(payload) => self.fail(DetectionError::DetectorPanic {
                id: self.scorer.name().to_string(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn fail(&self, error: DetectionError) -> DetectionOutcome {
        let opened = self.circuit.record_failure();
        tracing::error!(
            code = error.error_code(),
            error = %error,
            failures = self.circuit.consecutive_failures(),
            circuit_opened = opened,
            "detection pipeline failed"
        );
        DetectionOutcome::unknown(DetectionPath::Failed)
    }

    fn run_pipeline(
        &self,
        data: &Value,
        object: &Map<String, Value>,
        serialized: Arc<str>,
    ) -> Result<DetectionOutcome, DetectionError> {
        let assessment = ComplexityAnalyzer::assess_serialized(&serialized);
        if assessment.too_complex {
            tracing::debug!(
                reason = ?assessment.reason,
                size_chars = assessment.stats.size_chars,
                "input too complex, using quick scoring"
            );
            return Ok(DetectionOutcome::new(self.quick.detect(object), DetectionPath::QuickPath));
        }

        if let Some(format) = self.fast_path.check(object) {
            return Ok(DetectionOutcome::new(format, DetectionPath::FastPath));
        }

        let sample = self.cache.sample_for(data, serialized);
        self.stats.record_evidence_pass();
        let analysis = self.analyze(&sample);
        let Some(top) = ConfidenceCalculator::top_format(&analysis.scores) else {
            return Ok(DetectionOutcome::unknown(DetectionPath::FullScoring));
        };
        if top.raw <= 0.0 {
            tracing::debug!("no evidence for any format");
            return Ok(DetectionOutcome::unknown(DetectionPath::FullScoring));
        }

        let metrics = analysis.accumulator.metrics(top.format);
        let scored = self.scorer.calculate_confidence(&metrics, top.format, false)?;
        if self
            .evaluator
            .is_sufficient_for_detection(top.raw, &metrics, scored.confidence)
        {
            Ok(DetectionOutcome::new(top.format, DetectionPath::FullScoring))
        } else {
            tracing::debug!(
                candidate = %top.format,
                raw_score = top.raw,
                confidence = scored.confidence,
                "insufficient evidence"
            );
            Ok(DetectionOutcome::unknown(DetectionPath::FullScoring))
        }
    }

    /// Collect evidence for every registered format in parallel. Each
    /// worker owns its profile.
    fn analyze(&self, sample: &Sample) -> Analysis {
        let profiles: Vec<(SupportedFormat, EvidenceProfile)> = self
            .registry
            .definitions()
            .par_iter()
            .map(|def| {
                let (items, _) = self.collector.collect_evidence(sample, def.format);
                let mut profile = EvidenceProfile::new(def.total_possible_weight());
                for item in items {
                    profile.add(item);
                }
                (def.format, profile)
            })
            .collect();

        let formats: Vec<SupportedFormat> = profiles.iter().map(|(f, _)| *f).collect();
        let mut accumulator = EvidenceAccumulator::new();
        for (format, profile) in profiles {
            accumulator.insert_profile(format, profile);
        }
        let scores = accumulator.scores(&formats);
        Analysis {
            accumulator,
            scores,
        }
    }

    fn sample_of(&self, data: &Value) -> Option<Sample> {
        non_empty_object(data)?;
        let serialized: Arc<str> = serde_json::to_string(data).ok()?.into();
        Some(self.cache.sample_for(data, serialized))
    }

    fn penalized_confidence(&self, analysis: &Analysis, sample: &Sample, format: SupportedFormat) -> f64 {
        let Some(def) = self.registry.definition(format) else {
            return 0.0;
        };
        let base = ConfidenceCalculator::confidence_for(format, &analysis.scores);
        let coverage = RequiredKeyCoverage::measure(def, sample.keys());
        (base * required_key_penalty(format, &coverage)).clamp(0.0, 1.0)
    }

    /// Confidence in [0, 1] that `data` is `format`: the relative
    /// confidence times the required-key coverage penalty.
    pub fn get_format_confidence(&self, data: &Value, format: SupportedFormat) -> f64 {
        if format == SupportedFormat::Unknown {
            return 0.0;
        }
        let Some(sample) = self.sample_of(data) else {
            return 0.0;
        };
        let analysis = self.analyze(&sample);
        self.penalized_confidence(&analysis, &sample, format)
    }

    /// Evidence collected for `format`, flattened for diagnostics.
    pub fn evidence_breakdown(&self, data: &Value, format: SupportedFormat) -> Vec<EvidenceSummary> {
        match self.sample_of(data) {
            Some(sample) => self
                .collector
                .collect_evidence(&sample, format)
                .0
                .iter()
                .map(EvidenceSummary::from)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Detect, then explain: per-format confidences, the winner's evidence,
    /// the log-Bayes posterior over formats, and a metadata record.
    pub fn describe(&self, data: &Value) -> DetectionReport {
        let outcome = self.detect(data);
        let serialized = serde_json::to_string(data).unwrap_or_default();
        let complexity = non_empty_object(data).map(|_| ComplexityAnalyzer::assess_serialized(&serialized));

        let (confidences, evidence, posterior) = match self.sample_of(data) {
            Some(sample) => {
                let analysis = self.analyze(&sample);
                let confidences: Vec<(SupportedFormat, f64)> = self
                    .registry
                    .formats()
                    .map(|f| (f, self.penalized_confidence(&analysis, &sample, f)))
                    .collect();
                let evidence: Vec<EvidenceSummary> = analysis
                    .accumulator
                    .profile(outcome.format)
                    .map(|p| p.items().iter().map(EvidenceSummary::from).collect())
                    .unwrap_or_default();
                let posterior = self.posterior_of(&analysis);
                (confidences, evidence, posterior)
            }
            None => (
                self.registry.formats().map(|f| (f, 0.0)).collect(),
                Vec::new(),
                self.posterior_model.posterior_distribution(&[]),
            ),
        };

        let confidence = confidences
            .iter()
            .find(|(f, _)| *f == outcome.format)
            .map(|(_, c)| *c)
            .unwrap_or(0.0);
        let metadata = DetectionMetadata {
            format: outcome.format,
            confidence,
            path: outcome.path,
            content_hash: content_hash_hex(&serialized),
            evidence_count: evidence.len(),
            scorer: self.scorer.name(),
            detected_at_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };

        DetectionReport {
            outcome,
            confidences,
            evidence,
            posterior,
            complexity,
            metadata,
        }
    }

    /// Every format a caller may see, including UNKNOWN.
    pub fn supported_formats(&self) -> Vec<SupportedFormat> {
        self.registry.supported_formats()
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn stats(&self) -> DetectorStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.circuit.consecutive_failures()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Posterior over registered formats for `data` under the log-Bayes model.
    pub fn posterior_distribution(&self, data: &Value) -> Option<PosteriorDistribution> {
        let sample = self.sample_of(data)?;
        Some(self.posterior_of(&self.analyze(&sample)))
    }

    fn posterior_of(&self, analysis: &Analysis) -> PosteriorDistribution {
        let per_format: Vec<(SupportedFormat, &[EvidenceItem])> = self
            .registry
            .formats()
            .map(|f| {
                let items = analysis
                    .accumulator
                    .profile(f)
                    .map(EvidenceProfile::items)
                    .unwrap_or(&[]);
                (f, items)
            })
            .collect();
        self.posterior_model.posterior_distribution(&per_format)
    }
}

fn non_empty_object(data: &Value) -> Option<&Map<String, Value>> {
    data.as_object().filter(|m| !m.is_empty())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
