//! Inference module for bird species identification.

mod engine;
mod labels;
mod model;
mod normalize;
mod types;

pub use engine::ClassificationEngine;
pub use labels::LabelTable;
pub use model::{ModelHandle, ModelSource, OnnxModel, ScoreVector, ScoringModel};
pub use normalize::ScoreNormalization;
pub use types::{ClassificationResult, ScoredLabel};
