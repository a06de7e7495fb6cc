//! Shaping, scoring and interpretation in one call.

use crate::audio::{FeatureShaper, RawAudio, Sample};
use crate::config::Config;
use crate::constants::DEFAULT_TOP_K;
use crate::error::{Error, Result};
use crate::inference::{
    ClassificationResult, LabelTable, ModelHandle, ModelSource, ScoreNormalization, ScoreVector,
    ScoredLabel,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Turns captured audio into a labeled, confidence-ranked result.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    shaper: FeatureShaper,
    model: Arc<ModelHandle>,
    labels: LabelTable,
    sample_rate: u32,
    normalization: ScoreNormalization,
    top_k: usize,
}

impl ClassificationEngine {
    /// Create an engine around a shared model handle.
    pub fn new(
        model: Arc<ModelHandle>,
        labels: LabelTable,
        input_size: usize,
        sample_rate: u32,
    ) -> Self {
        Self {
            shaper: FeatureShaper::new(input_size),
            model,
            labels,
            sample_rate,
            normalization: ScoreNormalization::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how raw scores are turned into confidences.
    #[must_use]
    pub fn with_normalization(mut self, normalization: ScoreNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Set how many ranked candidates each result keeps.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Build an engine from configuration.
    ///
    /// A model that fails to load is reported once and the engine keeps an
    /// empty handle: every classification then fails with
    /// [`Error::ModelUnavailable`] until the handle is reloaded. Label file
    /// errors are returned.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model_config = &config.model;

        let labels = match &model_config.labels {
            Some(path) => LabelTable::from_file(path)?,
            None => LabelTable::default(),
        };
        info!("Label table: {} species", labels.len());

        let model = match &model_config.path {
            Some(path) => {
                let source = ModelSource {
                    path: path.clone(),
                    input_size: model_config.input_size,
                    layout: model_config.layout,
                    intra_threads: model_config.intra_threads,
                };
                ModelHandle::load(&source).unwrap_or_else(|e| {
                    error!("{e}");
                    ModelHandle::unloaded()
                })
            }
            None => {
                warn!("No model configured, classification is unavailable");
                ModelHandle::unloaded()
            }
        };

        Ok(Self::new(
            Arc::new(model),
            labels,
            model_config.input_size,
            model_config.sample_rate,
        )
        .with_normalization(config.classification.normalization)
        .with_top_k(config.classification.top_k))
    }

    /// Shared model handle.
    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    /// Label table.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Sample rate captured audio should arrive in.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Tensor length fed to the model.
    pub fn input_size(&self) -> usize {
        self.shaper.input_size()
    }

    /// Classify `raw` with the engine's own model.
    pub fn classify<S: Sample>(&self, raw: &RawAudio<S>) -> Result<ClassificationResult> {
        self.classify_with(raw, &self.model)
    }

    /// Classify `raw` with `model`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAudio`] from shaping, unchanged
    /// - [`Error::ModelUnavailable`] if `model` has nothing loaded
    /// - [`Error::ShapeMismatch`] if the model input size or score count is wrong
    /// - [`Error::Inference`] if scoring fails or yields non-finite scores
    pub fn classify_with<S: Sample>(
        &self,
        raw: &RawAudio<S>,
        model: &ModelHandle,
    ) -> Result<ClassificationResult> {
        if raw.sample_rate() != self.sample_rate {
            warn!(
                "Audio is {} Hz but the model expects {} Hz",
                raw.sample_rate(),
                self.sample_rate
            );
        }

        let tensor = self.shaper.shape(raw)?;
        debug!(
            "Shaped {} samples into a {}-value tensor",
            raw.len(),
            tensor.len()
        );

        let scores = model.score(&tensor)?;
        let ranked = self.interpret(&scores)?;

        ClassificationResult::from_ranked(ranked, Utc::now()).ok_or_else(|| Error::Internal {
            message: "label table is empty".to_string(),
        })
    }

    /// Rank the labeled classes of a score vector, best first.
    ///
    /// Only the first `labels.len()` scores are considered; equal scores keep
    /// label table order.
    pub fn interpret(&self, scores: &ScoreVector) -> Result<Vec<ScoredLabel>> {
        let k = self.labels.len();
        if scores.len() < k {
            return Err(Error::ShapeMismatch {
                expected: k,
                actual: scores.len(),
            });
        }

        let head = &scores.as_slice()[..k];
        if let Some(index) = head.iter().position(|s| !s.is_finite()) {
            return Err(Error::Inference {
                reason: format!("model produced a non-finite score for class {index}"),
            });
        }

        let confidences = self.normalization.apply(head);

        // Stable sort: ties stay in label order
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&a, &b| confidences[b].total_cmp(&confidences[a]));

        Ok(order
            .into_iter()
            .take(self.top_k)
            .filter_map(|index| {
                self.labels.get(index).map(|label| ScoredLabel {
                    label: label.to_string(),
                    confidence: confidences[index],
                })
            })
            .collect())
    }
}
