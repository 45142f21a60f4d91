//! Serialized views of one input document.

use std::sync::Arc;

use exportsniff_core::errors::DetectionError;
use exportsniff_core::types::collections::FxHashMap;
use serde_json::Value;

/// Where a key was seen in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    /// Smallest object-nesting depth at which the key occurs. Top-level
    /// keys have depth 0; arrays do not add depth.
    pub min_depth: usize,
    /// True if any occurrence holds an object or array.
    pub holds_container: bool,
}

/// Lower-cased key name to its shallowest context.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: FxHashMap<String, KeyContext>,
}

impl KeyIndex {
    /// Walk `value` and record every object key.
    pub fn build(value: &Value) -> Self {
        let mut index = Self::default();
        index.walk(value, 0);
        index
    }

    fn walk(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let container = matches!(child, Value::Object(_) | Value::Array(_));
                    self.keys
                        .entry(key.to_lowercase())
                        .and_modify(|ctx| {
                            ctx.min_depth = ctx.min_depth.min(depth);
                            ctx.holds_container |= container;
                        })
                        .or_insert(KeyContext {
                            min_depth: depth,
                            holds_container: container,
                        });
                    self.walk(child, depth + 1);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, depth);
                }
            }
            _ => {}
        }
    }

    /// Context of a lower-cased key, if the key occurs anywhere.
    pub fn get(&self, lowered_key: &str) -> Option<KeyContext> {
        self.keys.get(lowered_key).copied()
    }

    pub fn contains(&self, lowered_key: &str) -> bool {
        self.keys.contains_key(lowered_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Original string, lower-cased string, and key index of one document.
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct Sample {
    original: Arc<str>,
    lowered: Arc<str>,
    keys: Arc<KeyIndex>,
}

impl Sample {
    /// Serialize `value` compactly and derive both views.
    pub fn from_value(value: &Value) -> Result<Self, DetectionError> {
        let original: Arc<str> = serde_json::to_string(value)
            .map_err(|e| DetectionError::Serialization(e.to_string()))?
            .into();
        let lowered: Arc<str> = original.to_lowercase().into();
        Ok(Self {
            original,
            lowered,
            keys: Arc::new(KeyIndex::build(value)),
        })
    }

    /// Assemble a sample from views that were already computed (cache hits).
    pub fn from_parts(original: Arc<str>, lowered: Arc<str>, keys: Arc<KeyIndex>) -> Self {
        Self {
            original,
            lowered,
            keys,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn lowered(&self) -> &str {
        &self.lowered
    }

    pub fn keys(&self) -> &KeyIndex {
        &self.keys
    }
}
