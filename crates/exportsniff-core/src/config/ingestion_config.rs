//! Ingestion guard configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Coarse limits applied before detection is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IngestionConfig {
    /// Largest accepted JSON document, in megabytes. Default: 10.
    pub max_json_size_mb: Option<u64>,
}

impl IngestionConfig {
    /// Returns the effective size limit in megabytes, defaulting to 10.
    pub fn effective_max_json_size_mb(&self) -> u64 {
        self.max_json_size_mb
            .unwrap_or(constants::DEFAULT_MAX_JSON_SIZE_MB)
    }

    /// Returns the effective size limit in bytes.
    pub fn effective_max_json_size_bytes(&self) -> u64 {
        self.effective_max_json_size_mb().saturating_mul(1024 * 1024)
    }
}
