//! Model ownership and scoring.

use crate::audio::FeatureTensor;
use crate::config::InputLayout;
use crate::error::{Error, Result};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Per-class output of the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
    /// Wrap raw model output.
    pub fn new(scores: Vec<f32>) -> Self {
        Self(scores)
    }

    /// Scores in model output order.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of scores.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the model produced nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An opaque classifier: fixed-size input in, one score per class out.
pub trait ScoringModel: Send {
    /// Number of input values the model consumes.
    fn input_size(&self) -> usize;

    /// Score one input of exactly [`input_size`](Self::input_size) values.
    fn score(&mut self, input: &[f32]) -> Result<Vec<f32>>;
}

/// Where and how to load a model.
#[derive(Debug, Clone)]
pub struct ModelSource {
    /// Path to the ONNX model file.
    pub path: PathBuf,
    /// Number of input samples the model expects.
    pub input_size: usize,
    /// Input tensor layout.
    pub layout: InputLayout,
    /// Intra-op thread count, runtime default when `None`.
    pub intra_threads: Option<usize>,
}

/// ONNX Runtime backed classifier.
pub struct OnnxModel {
    session: Session,
    input_size: usize,
    layout: InputLayout,
}

impl OnnxModel {
    /// Load an ONNX model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the file is missing, empty, or rejected
    /// by the runtime.
    pub fn load(source: &ModelSource) -> Result<Self> {
        let load_err = |reason: String| Error::ModelLoad {
            path: source.path.clone(),
            reason,
        };

        let bytes = std::fs::read(&source.path).map_err(|e| load_err(e.to_string()))?;
        if bytes.is_empty() {
            return Err(load_err("model file is empty".to_string()));
        }

        let mut builder = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(e.to_string()))?;
        if let Some(threads) = source.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| load_err(e.to_string()))?;
        }
        let session = builder
            .commit_from_memory(&bytes)
            .map_err(|e| load_err(e.to_string()))?;

        info!(
            "Loaded model {} (input_size: {}, layout: {})",
            source.path.display(),
            source.input_size,
            source.layout
        );

        Ok(Self {
            session,
            input_size: source.input_size,
            layout: source.layout,
        })
    }
}

impl ScoringModel for OnnxModel {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn score(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let data = input.to_vec();
        let tensor = match self.layout {
            InputLayout::Batched => Tensor::from_array(([1usize, self.input_size], data)),
            InputLayout::Flat => Tensor::from_array(([self.input_size], data)),
        }
        .map_err(inference_err)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(inference_err)?;
        let first = first_output(outputs.values())?;
        let (shape, scores) = first
            .try_extract_tensor::<f32>()
            .map_err(inference_err)?;
        debug!("Model output shape: {:?}", shape);

        Ok(scores.to_vec())
    }
}

fn first_output<T>(mut outputs: impl Iterator<Item = T>) -> Result<T> {
    outputs.next().ok_or_else(|| Error::Inference {
        reason: "model produced no outputs".to_string(),
    })
}

fn inference_err(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

/// Owns a loaded classifier and serializes access to it.
///
/// The handle stays valid for the process lifetime; [`release`](Self::release)
/// frees the model early and every later [`score`](Self::score) fails with
/// [`Error::ModelUnavailable`] until a [`reload`](Self::reload).
pub struct ModelHandle {
    model: Mutex<Option<Box<dyn ScoringModel>>>,
}

impl ModelHandle {
    /// Load an ONNX model into a new handle.
    pub fn load(source: &ModelSource) -> Result<Self> {
        let model = OnnxModel::load(source)?;
        Ok(Self::from_model(Box::new(model)))
    }

    /// Wrap an already constructed model.
    pub fn from_model(model: Box<dyn ScoringModel>) -> Self {
        Self {
            model: Mutex::new(Some(model)),
        }
    }

    /// A handle with nothing loaded.
    pub fn unloaded() -> Self {
        Self {
            model: Mutex::new(None),
        }
    }

    /// Whether a model is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.slot().is_some()
    }

    /// Input size of the loaded model.
    pub fn input_size(&self) -> Option<usize> {
        self.slot().as_ref().map(|m| m.input_size())
    }

    /// Score a tensor.
    ///
    /// # Errors
    ///
    /// - [`Error::ModelUnavailable`] if no model is loaded
    /// - [`Error::ShapeMismatch`] if the tensor length differs from the model input size
    /// - [`Error::Inference`] if the model fails
    pub fn score(&self, tensor: &FeatureTensor) -> Result<ScoreVector> {
        let mut slot = self.model.lock().map_err(|_| Error::Inference {
            reason: "model lock poisoned by an earlier failure".to_string(),
        })?;
        let model = slot.as_mut().ok_or(Error::ModelUnavailable)?;

        let expected = model.input_size();
        if tensor.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: tensor.len(),
            });
        }

        model.score(tensor.as_slice()).map(ScoreVector::new)
    }

    /// Drop the loaded model. Idempotent.
    pub fn release(&self) {
        if self.slot().take().is_some() {
            info!("Released classification model");
        }
    }

    /// Swap in a model built elsewhere, dropping the previous one.
    pub fn replace(&self, model: Box<dyn ScoringModel>) {
        *self.slot() = Some(model);
    }

    /// Load a replacement model.
    ///
    /// The current model is released first; if the replacement fails to
    /// load, the handle stays empty.
    pub fn reload(&self, source: &ModelSource) -> Result<()> {
        self.release();
        match OnnxModel::load(source) {
            Ok(model) => {
                self.replace(Box::new(model));
                Ok(())
            }
            Err(e) => {
                warn!("Model reload failed, handle left empty: {e}");
                Err(e)
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Box<dyn ScoringModel>>> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
