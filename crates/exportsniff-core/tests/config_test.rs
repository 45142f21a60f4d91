//! Tests for the exportsniff configuration system.

use std::sync::Mutex;
use std::time::Duration;

use exportsniff_core::config::{CliOverrides, ExportSniffConfig, ScorerStrategy};
use exportsniff_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all EXPORTSNIFF_ env vars to prevent cross-test contamination.
fn clear_env_vars() {
    for key in [
        "EXPORTSNIFF_CIRCUIT_FAILURE_THRESHOLD",
        "EXPORTSNIFF_CIRCUIT_COOLDOWN_SECS",
        "EXPORTSNIFF_MIN_DETECTION_TIME_MS",
        "EXPORTSNIFF_SCORER",
        "EXPORTSNIFF_CACHE_MAX_SIZE",
        "EXPORTSNIFF_MAX_JSON_SIZE_MB",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_four_layer_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("exportsniff.toml"),
        r#"
[detection]
circuit_failure_threshold = 7
circuit_cooldown_secs = 12
scorer = "mvlp"

[cache]
max_cache_size = 64
"#,
    )
    .unwrap();

    // Env overrides project for the threshold.
    std::env::set_var("EXPORTSNIFF_CIRCUIT_FAILURE_THRESHOLD", "9");

    // CLI overrides project for the scorer.
    let cli = CliOverrides {
        scorer: Some(ScorerStrategy::LogBayes),
        ..Default::default()
    };

    let config = ExportSniffConfig::load(dir.path(), Some(&cli)).unwrap();

    assert_eq!(config.detection.effective_circuit_failure_threshold(), 9);
    assert_eq!(config.detection.effective_scorer(), ScorerStrategy::LogBayes);
    assert_eq!(config.detection.effective_circuit_cooldown(), Duration::from_secs(12));
    assert_eq!(config.cache.effective_max_cache_size(), 64);

    clear_env_vars();
}

#[test]
fn test_load_missing_files_fallback() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempdir();
    let config = ExportSniffConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.detection.effective_circuit_failure_threshold(), 5);
    assert_eq!(config.detection.effective_min_detection_time(), Duration::from_millis(50));
    assert_eq!(config.cache.effective_max_cache_size(), 1000);
    assert_eq!(config.ingestion.effective_max_json_size_mb(), 10);
}

#[test]
fn test_env_var_override() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempdir();
    std::env::set_var("EXPORTSNIFF_SCORER", "weighted_evidence");
    std::env::set_var("EXPORTSNIFF_MAX_JSON_SIZE_MB", "2");

    let config = ExportSniffConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.detection.scorer, Some(ScorerStrategy::WeightedEvidence));
    assert_eq!(config.ingestion.effective_max_json_size_bytes(), 2 * 1024 * 1024);

    clear_env_vars();
}

#[test]
fn test_unparseable_env_value_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempdir();
    std::env::set_var("EXPORTSNIFF_CACHE_MAX_SIZE", "lots");

    let config = ExportSniffConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.cache.max_cache_size, None);

    clear_env_vars();
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("exportsniff.toml"), "this is not valid toml {{{{").unwrap();

    match ExportSniffConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_validation_rejects_out_of_range_values() {
    let result = ExportSniffConfig::from_toml(
        r#"
[detection]
min_detection_confidence = 1.5
"#,
    );
    match result {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "detection.min_detection_confidence");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }

    assert!(ExportSniffConfig::from_toml("[cache]\nmax_cache_size = 0\n").is_err());
    assert!(ExportSniffConfig::from_toml("[detection]\ncircuit_failure_threshold = 0\n").is_err());
    assert!(ExportSniffConfig::from_toml("[ingestion]\nmax_json_size_mb = 0\n").is_err());
}

#[test]
fn test_cooldown_is_bounded() {
    let mut config = ExportSniffConfig::default();
    config.detection.circuit_cooldown_secs = Some(u64::MAX);
    match ExportSniffConfig::validate(&config) {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "detection.circuit_cooldown_secs");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }

    config.detection.circuit_cooldown_secs = Some(86_400);
    assert!(ExportSniffConfig::validate(&config).is_ok());
}

#[test]
fn test_unknown_scorer_is_a_parse_error() {
    let result = ExportSniffConfig::from_toml("[detection]\nscorer = \"softmax\"\n");
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_toml_round_trip_preserves_overrides() {
    let config = ExportSniffConfig::from_toml(
        r#"
[detection]
scorer = "log_bayes"
min_detection_time_ms = 0
"#,
    )
    .unwrap();
    let serialized = config.to_toml().unwrap();
    let reparsed = ExportSniffConfig::from_toml(&serialized).unwrap();
    assert_eq!(reparsed.detection.scorer, Some(ScorerStrategy::LogBayes));
    assert_eq!(reparsed.detection.min_detection_time_ms, Some(0));
}
