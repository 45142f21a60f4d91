//! # exportsniff-core
//!
//! Foundation crate for the exportsniff format-detection engine.
//! Defines errors, config, tracing setup, constants, and shared collection types.
//! The detection crate depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::ExportSniffConfig;
pub use errors::error_code::ExportSniffErrorCode;
pub use types::collections::{FxHashMap, FxHashSet};
