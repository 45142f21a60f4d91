//! Configuration system for exportsniff.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod cache_config;
pub mod detection_config;
pub mod exportsniff_config;
pub mod ingestion_config;

pub use cache_config::CacheConfig;
pub use detection_config::{DetectionConfig, ScorerStrategy};
pub use exportsniff_config::{CliOverrides, ExportSniffConfig};
pub use ingestion_config::IngestionConfig;
