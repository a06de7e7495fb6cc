//! Score normalization.

use crate::constants::confidence;
use serde::{Deserialize, Serialize};

/// How raw model scores become confidences in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreNormalization {
    /// Keep scores that already look like probabilities, softmax otherwise.
    #[default]
    Auto,
    /// Use scores as-is, clamped to [0, 1].
    None,
    /// Softmax across the labeled classes.
    Softmax,
    /// Independent logistic per class.
    Sigmoid,
}

impl ScoreNormalization {
    /// Normalize `scores`. Inputs must be finite.
    pub fn apply(self, scores: &[f32]) -> Vec<f32> {
        match self {
            Self::Auto if scores.iter().all(|s| (confidence::MIN..=confidence::MAX).contains(s)) => {
                scores.to_vec()
            }
            Self::Auto | Self::Softmax => softmax(scores),
            Self::None => scores
                .iter()
                .map(|s| s.clamp(confidence::MIN, confidence::MAX))
                .collect(),
            Self::Sigmoid => scores.iter().map(|&s| sigmoid(s)).collect(),
        }
    }
}

impl std::fmt::Display for ScoreNormalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::None => write!(f, "none"),
            Self::Softmax => write!(f, "softmax"),
            Self::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
