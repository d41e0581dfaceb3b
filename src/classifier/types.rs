use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::emotion::Emotion;

/// One answer from the classification service.
///
/// `label`, `confidence` and `distribution` arrive together and are kept
/// as sent; none is re-derived from the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Emotion,
    pub confidence: f64,
    pub distribution: HashMap<Emotion, f64>,
}

impl ClassificationResult {
    /// Probability for `emotion`, or 0 when the service left it out.
    pub fn probability(&self, emotion: Emotion) -> f64 {
        self.distribution.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Text drawn above the face box, e.g. `Happy (80.0%)`.
    pub fn caption(&self) -> String {
        format!("{} ({})", self.label, format_percent(self.confidence))
    }
}

pub(crate) fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
