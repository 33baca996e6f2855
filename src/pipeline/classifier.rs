use ndarray::Array4;
use std::path::Path;
use tracing::{info, warn};

use super::preprocess::INPUT_SIZE;
use crate::error::{EmotuneError, Result};
use crate::models::{Emotion, EmotionPrediction};

/// Forward pass of a loaded expression model. Implementations must be safe to
/// call from several threads at once.
pub trait EmotionModel: Send + Sync {
    /// Raw per-class scores for a `[1, 48, 48, 1]` input, in `Emotion::ALL` order.
    fn infer(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>>;
}

enum ClassifierState {
    Ready(Box<dyn EmotionModel>),
    Unavailable(String),
}

/// Maps a normalized face tensor to an emotion label. The model is loaded
/// once and never mutated afterwards.
pub struct EmotionClassifier {
    state: ClassifierState,
}

impl EmotionClassifier {
    /// Load the model artifact. Failure leaves the classifier `Unavailable`;
    /// every `classify` call then fails with `ModelUnavailable`.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Emotion model not found at {:?}", path);
            return Self::unavailable(format!("emotion model not found at {:?}", path));
        }
        match load_backend(path) {
            Ok(model) => {
                info!("Emotion model loaded from {:?}", path);
                Self::from_model(model)
            }
            Err(e) => {
                warn!("Emotion model not loaded: {:#}", e);
                Self::unavailable(format!("emotion model at {:?} could not be loaded: {}", path, e))
            }
        }
    }

    pub fn from_model(model: Box<dyn EmotionModel>) -> Self {
        Self { state: ClassifierState::Ready(model) }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { state: ClassifierState::Unavailable(reason.into()) }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ClassifierState::Ready(_))
    }

    /// Full probability distribution over `Emotion::ALL`.
    pub fn probabilities(&self, tensor: &Array4<f32>) -> Result<Vec<f32>> {
        let model = match &self.state {
            ClassifierState::Ready(m) => m,
            ClassifierState::Unavailable(reason) => {
                return Err(EmotuneError::ModelUnavailable(reason.clone()))
            }
        };
        let side = INPUT_SIZE as usize;
        if tensor.shape() != [1, side, side, 1] {
            return Err(EmotuneError::InvalidImage(format!(
                "classifier expects [1, {}, {}, 1], got {:?}",
                side,
                side,
                tensor.shape()
            )));
        }
        let raw = model
            .infer(tensor)
            .map_err(|e| EmotuneError::Inference(format!("{:#}", e)))?;
        to_probabilities(raw)
    }

    pub fn classify(&self, tensor: &Array4<f32>) -> Result<EmotionPrediction> {
        Ok(self.predict(tensor)?.0)
    }

    /// Prediction plus the distribution it was taken from, from one forward pass.
    pub fn predict(&self, tensor: &Array4<f32>) -> Result<(EmotionPrediction, Vec<f32>)> {
        let probs = self.probabilities(tensor)?;
        let (idx, confidence) = argmax(&probs);
        let label = Emotion::from_index(idx)
            .ok_or_else(|| EmotuneError::Inference(format!("class index {} out of range", idx)))?;
        Ok((EmotionPrediction { label, confidence: confidence.clamp(0.0, 1.0) }, probs))
    }
}

/// Accept a probability vector as-is; treat anything else as logits.
fn to_probabilities(raw: Vec<f32>) -> Result<Vec<f32>> {
    if raw.len() != Emotion::ALL.len() {
        return Err(EmotuneError::Inference(format!(
            "model produced {} scores, expected {}",
            raw.len(),
            Emotion::ALL.len()
        )));
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(EmotuneError::Inference("model produced non-finite scores".to_string()));
    }
    let in_range = raw.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = raw.iter().sum();
    if in_range && (sum - 1.0).abs() < 1e-3 {
        Ok(raw)
    } else {
        Ok(softmax(&raw))
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&x| x / sum).collect()
}

/// First index of the maximum, like numpy's argmax.
fn argmax(values: &[f32]) -> (usize, f32) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}

#[cfg(feature = "onnx")]
fn load_backend(path: &Path) -> anyhow::Result<Box<dyn EmotionModel>> {
    Ok(Box::new(onnx::OnnxEmotionModel::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_backend(_path: &Path) -> anyhow::Result<Box<dyn EmotionModel>> {
    anyhow::bail!("built without ONNX Runtime support (enable the `onnx` feature)")
}

#[cfg(feature = "onnx")]
pub mod onnx {
    use anyhow::{Context, Result};
    use ndarray::Array4;
    use ort::session::Session;
    use ort::value::Value;
    use parking_lot::Mutex;
    use std::path::Path;

    use super::EmotionModel;

    /// Emotion model exported to ONNX (NHWC `[1, 48, 48, 1]` in, 7 scores out).
    pub struct OnnxEmotionModel {
        session: Mutex<Session>,
        input_name: String,
    }

    impl OnnxEmotionModel {
        pub fn load(path: &Path) -> Result<Self> {
            let session = Session::builder()?
                .commit_from_file(path)
                .context("Failed to create emotion model session")?;
            let input_name = session
                .inputs
                .first()
                .context("Emotion model has no inputs")?
                .name
                .clone();
            Ok(Self { session: Mutex::new(session), input_name })
        }
    }

    impl EmotionModel for OnnxEmotionModel {
        fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
            let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
            let data: Vec<f32> = input.iter().copied().collect();
            let value = Value::from_array((shape, data))
                .context("Failed to create emotion input tensor")?;

            // The session needs exclusive access per run; weights stay read-only.
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => value])
                .context("Emotion inference failed")?;
            let (_, scores) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Emotion model output is not an f32 tensor")?;
            Ok(scores.to_vec())
        }
    }
}
