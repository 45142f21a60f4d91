//! Format catalog: supported formats and their tiered indicator fields.

pub mod definitions;
pub mod registry;
pub mod types;

pub use registry::{FormatInfo, FormatRegistry};
pub use types::{FieldIndicator, FormatDefinition, SupportedFormat};
