//! Persisted observation record.

use crate::inference::ClassificationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One identified bird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Species name.
    pub label: String,
    /// When the bird was identified.
    pub timestamp: DateTime<Utc>,
    /// Where the bird was heard.
    pub location: String,
    /// Classifier confidence (0.0 - 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Saved recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<PathBuf>,
}

impl Observation {
    /// Observation for a classification result at `location`.
    pub fn from_result(result: &ClassificationResult, location: &str) -> Self {
        Self {
            label: result.label().to_string(),
            timestamp: result.timestamp(),
            location: location.to_string(),
            confidence: Some(result.confidence()),
            clip: None,
        }
    }
}
