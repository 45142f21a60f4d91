//! Shared constants for the exportsniff engine.

/// exportsniff version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Consecutive pipeline failures before the circuit opens.
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;

/// Seconds the circuit stays open before full detection is retried.
pub const DEFAULT_CIRCUIT_COOLDOWN_SECS: u64 = 30;

/// Longest accepted circuit cooldown (one day).
pub const MAX_CIRCUIT_COOLDOWN_SECS: u64 = 86_400;

/// Top-level strong indicators needed for the fast path.
pub const DEFAULT_FAST_PATH_THRESHOLD: usize = 2;

/// Minimum weighted evidence score for a full detection to be accepted.
pub const DEFAULT_MIN_DETECTION_SCORE: f64 = 3.0;

/// Minimum scorer confidence for a full detection to be accepted.
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f64 = 0.15;

/// Wall-clock floor for a single detection, in milliseconds.
pub const DEFAULT_MIN_DETECTION_TIME_MS: u64 = 50;

/// Entries per detection cache map.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

/// Bytes of the serialized input hashed into a cache key.
pub const DEFAULT_CACHE_KEY_PREFIX_BYTES: usize = 4096;

/// Largest JSON document accepted by `detect_from_str`, in megabytes.
pub const DEFAULT_MAX_JSON_SIZE_MB: u64 = 10;

/// Default confidence scorer strategy.
pub const DEFAULT_SCORER: &str = "weighted_evidence";
