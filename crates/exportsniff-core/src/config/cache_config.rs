//! Detection cache configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the three detection cache maps.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries per cache map. Default: 1000.
    pub max_cache_size: Option<usize>,
    /// Bytes of serialized input hashed into a key. Default: 4096.
    pub key_prefix_bytes: Option<usize>,
}

impl CacheConfig {
    /// Returns the effective per-map capacity, defaulting to 1000.
    pub fn effective_max_cache_size(&self) -> usize {
        self.max_cache_size.unwrap_or(constants::DEFAULT_MAX_CACHE_SIZE)
    }

    /// Returns the effective key prefix length, defaulting to 4096 bytes.
    pub fn effective_key_prefix_bytes(&self) -> usize {
        self.key_prefix_bytes
            .unwrap_or(constants::DEFAULT_CACHE_KEY_PREFIX_BYTES)
    }
}
