//! Classification result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A species label with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    /// Species name.
    pub label: String,
    /// Confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Outcome of one successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    label: String,
    confidence: f32,
    timestamp: DateTime<Utc>,
    ranked: Vec<ScoredLabel>,
}

impl ClassificationResult {
    /// Build a result whose only ranked entry is the winning label.
    pub fn new(label: impl Into<String>, confidence: f32, timestamp: DateTime<Utc>) -> Self {
        let label = label.into();
        let ranked = vec![ScoredLabel {
            label: label.clone(),
            confidence,
        }];
        Self {
            label,
            confidence,
            timestamp,
            ranked,
        }
    }

    /// Build a result from labels ranked best first. Returns `None` if `ranked` is empty.
    pub fn from_ranked(ranked: Vec<ScoredLabel>, timestamp: DateTime<Utc>) -> Option<Self> {
        let best = ranked.first()?;
        Some(Self {
            label: best.label.clone(),
            confidence: best.confidence,
            timestamp,
            ranked,
        })
    }

    /// Winning species.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Confidence of the winning species.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// When the classification finished.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Best candidates, highest confidence first.
    pub fn ranked(&self) -> &[ScoredLabel] {
        &self.ranked
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ranked_takes_first_as_winner() {
        let ranked = vec![
            ScoredLabel {
                label: "Sparrow".to_string(),
                confidence: 0.7,
            },
            ScoredLabel {
                label: "Cardinal".to_string(),
                confidence: 0.15,
            },
        ];
        let result = ClassificationResult::from_ranked(ranked, Utc::now()).unwrap();
        assert_eq!(result.label(), "Sparrow");
        assert_eq!(result.confidence(), 0.7);
        assert_eq!(result.ranked().len(), 2);
    }

    #[test]
    fn test_from_ranked_empty_is_none() {
        assert!(ClassificationResult::from_ranked(Vec::new(), Utc::now()).is_none());
    }
}
