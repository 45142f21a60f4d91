//! Top-level exportsniff configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CacheConfig, DetectionConfig, IngestionConfig, ScorerStrategy};
use crate::constants;
use crate::errors::ConfigError;

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "exportsniff.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`EXPORTSNIFF_*`)
/// 3. Project config (`exportsniff.toml` in project root)
/// 4. User config (`~/.exportsniff/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportSniffConfig {
    pub detection: DetectionConfig,
    pub cache: CacheConfig,
    pub ingestion: IngestionConfig,
}

/// Override arguments supplied by an embedding CLI or service.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub scorer: Option<ScorerStrategy>,
    pub circuit_failure_threshold: Option<u32>,
    pub min_detection_time_ms: Option<u64>,
    pub max_json_size_mb: Option<u64>,
}

impl ExportSniffConfig {
    /// Load configuration with 4-layer resolution.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(ConfigError::ParseError { .. }) => {
                        return Err(ConfigError::ParseError {
                            path: user_config_path.display().to_string(),
                            message: "invalid TOML in user config".to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing and embedding).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &ExportSniffConfig) -> Result<(), ConfigError> {
        if config.detection.circuit_failure_threshold == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "detection.circuit_failure_threshold".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(secs) = config.detection.circuit_cooldown_secs {
            if secs > constants::MAX_CIRCUIT_COOLDOWN_SECS {
                return Err(ConfigError::ValidationFailed {
                    field: "detection.circuit_cooldown_secs".to_string(),
                    message: format!("must be at most {}", constants::MAX_CIRCUIT_COOLDOWN_SECS),
                });
            }
        }
        if config.detection.fast_path_threshold == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "detection.fast_path_threshold".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(confidence) = config.detection.min_detection_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ConfigError::ValidationFailed {
                    field: "detection.min_detection_confidence".to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(score) = config.detection.min_detection_score {
            if !score.is_finite() || score < 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "detection.min_detection_score".to_string(),
                    message: "must be a non-negative number".to_string(),
                });
            }
        }
        if config.cache.max_cache_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "cache.max_cache_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.cache.key_prefix_bytes == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "cache.key_prefix_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.ingestion.max_json_size_mb == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "ingestion.max_json_size_mb".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.exportsniff/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut ExportSniffConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ExportSniffConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut ExportSniffConfig, other: &ExportSniffConfig) {
        // Detection
        let (b, o) = (&mut base.detection, &other.detection);
        if o.circuit_failure_threshold.is_some() {
            b.circuit_failure_threshold = o.circuit_failure_threshold;
        }
        if o.circuit_cooldown_secs.is_some() {
            b.circuit_cooldown_secs = o.circuit_cooldown_secs;
        }
        if o.fast_path_threshold.is_some() {
            b.fast_path_threshold = o.fast_path_threshold;
        }
        if o.min_detection_score.is_some() {
            b.min_detection_score = o.min_detection_score;
        }
        if o.min_detection_confidence.is_some() {
            b.min_detection_confidence = o.min_detection_confidence;
        }
        if o.min_detection_time_ms.is_some() {
            b.min_detection_time_ms = o.min_detection_time_ms;
        }
        if o.scorer.is_some() {
            b.scorer = o.scorer;
        }

        // Cache
        if other.cache.max_cache_size.is_some() {
            base.cache.max_cache_size = other.cache.max_cache_size;
        }
        if other.cache.key_prefix_bytes.is_some() {
            base.cache.key_prefix_bytes = other.cache.key_prefix_bytes;
        }

        // Ingestion
        if other.ingestion.max_json_size_mb.is_some() {
            base.ingestion.max_json_size_mb = other.ingestion.max_json_size_mb;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `EXPORTSNIFF_CIRCUIT_FAILURE_THRESHOLD`, `EXPORTSNIFF_SCORER`, etc.
    fn apply_env_overrides(config: &mut ExportSniffConfig) {
        if let Some(v) = env_parse::<u32>("EXPORTSNIFF_CIRCUIT_FAILURE_THRESHOLD") {
            config.detection.circuit_failure_threshold = Some(v);
        }
        if let Some(v) = env_parse::<u64>("EXPORTSNIFF_CIRCUIT_COOLDOWN_SECS") {
            config.detection.circuit_cooldown_secs = Some(v);
        }
        if let Some(v) = env_parse::<u64>("EXPORTSNIFF_MIN_DETECTION_TIME_MS") {
            config.detection.min_detection_time_ms = Some(v);
        }
        if let Some(v) = env_parse::<ScorerStrategy>("EXPORTSNIFF_SCORER") {
            config.detection.scorer = Some(v);
        }
        if let Some(v) = env_parse::<usize>("EXPORTSNIFF_CACHE_MAX_SIZE") {
            config.cache.max_cache_size = Some(v);
        }
        if let Some(v) = env_parse::<u64>("EXPORTSNIFF_MAX_JSON_SIZE_MB") {
            config.ingestion.max_json_size_mb = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut ExportSniffConfig, cli: &CliOverrides) {
        if let Some(v) = cli.scorer {
            config.detection.scorer = Some(v);
        }
        if let Some(v) = cli.circuit_failure_threshold {
            config.detection.circuit_failure_threshold = Some(v);
        }
        if let Some(v) = cli.min_detection_time_ms {
            config.detection.min_detection_time_ms = Some(v);
        }
        if let Some(v) = cli.max_json_size_mb {
            config.ingestion.max_json_size_mb = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Read and parse an environment variable, ignoring unparseable values.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Returns the user-level config directory: `~/.exportsniff/`.
fn dirs_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".exportsniff"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
