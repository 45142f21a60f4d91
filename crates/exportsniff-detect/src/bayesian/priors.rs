//! Prior probability of each format before any evidence is seen.

use serde::{Deserialize, Serialize};

use crate::formats::SupportedFormat;

/// Prior table indexed in [`SupportedFormat::ALL`] order. Sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatPriors {
    priors: [f64; 6],
}

impl FormatPriors {
    /// Build a table from raw weights, normalized to sum to 1.
    /// Non-finite or negative weights count as zero; an all-zero table
    /// falls back to the defaults.
    pub fn from_weights(weights: [f64; 6]) -> Self {
        let cleaned = weights.map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
        let sum: f64 = cleaned.iter().sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            priors: cleaned.map(|w| w / sum),
        }
    }

    pub fn prior(&self, format: SupportedFormat) -> f64 {
        self.priors[index(format)]
    }
}

impl Default for FormatPriors {
    fn default() -> Self {
        // Zephyr, Xray, TestRail, TestLink, Generic, Unknown
        Self {
            priors: [0.20, 0.20, 0.20, 0.15, 0.20, 0.05],
        }
    }
}

fn index(format: SupportedFormat) -> usize {
    SupportedFormat::ALL
        .iter()
        .position(|f| *f == format)
        .unwrap_or(SupportedFormat::ALL.len() - 1)
}
