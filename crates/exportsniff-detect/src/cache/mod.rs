//! Detection caches and timing padding.

pub mod detection_cache;
pub mod hasher;

pub use detection_cache::{enforce_min_detection_time, CacheStats, DetectionCache};
