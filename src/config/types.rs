//! Configuration type definitions.

use crate::constants::{DEFAULT_LOCATION, DEFAULT_TOP_K, capture, model};
use crate::inference::ScoreNormalization;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier settings.
    pub model: ModelConfig,

    /// Result interpretation settings.
    pub classification: ClassificationConfig,

    /// Capture limits.
    pub capture: CaptureConfig,

    /// Observation log settings.
    pub journal: JournalConfig,
}

/// Classifier model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: Option<PathBuf>,

    /// Path to the labels file; the built-in species table is used when unset.
    pub labels: Option<PathBuf>,

    /// Number of samples per model input.
    pub input_size: usize,

    /// Sample rate the model expects, in Hz.
    pub sample_rate: u32,

    /// Input tensor layout.
    pub layout: InputLayout,

    /// ONNX Runtime intra-op threads.
    pub intra_threads: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            labels: None,
            input_size: model::DEFAULT_INPUT_SIZE,
            sample_rate: model::DEFAULT_SAMPLE_RATE,
            layout: InputLayout::default(),
            intra_threads: None,
        }
    }
}

/// Shape of the tensor handed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// `[1, input_size]`.
    #[default]
    Batched,
    /// `[input_size]`.
    Flat,
}

impl std::fmt::Display for InputLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Batched => write!(f, "batched"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

/// Result interpretation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// How raw scores become confidences.
    pub normalization: ScoreNormalization,

    /// Ranked candidates kept per result.
    pub top_k: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            normalization: ScoreNormalization::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Capture limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Longest capture kept, in seconds.
    pub max_duration_secs: f32,

    /// Chunks queued between the capture source and the buffer.
    pub channel_capacity: usize,

    /// Samples per chunk for file capture.
    pub chunk_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: capture::DEFAULT_MAX_DURATION_SECS,
            channel_capacity: capture::DEFAULT_CHANNEL_CAPACITY,
            chunk_size: capture::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Observation log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Log file path; defaults to the platform data directory.
    pub path: Option<PathBuf>,

    /// Location recorded with each observation.
    pub location: String,

    /// Save the captured audio of each observation as a WAV clip.
    pub keep_clips: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: None,
            location: DEFAULT_LOCATION.to_string(),
            keep_clips: false,
        }
    }
}
