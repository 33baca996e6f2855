pub mod classifier;
pub mod frame;
pub mod locator;
pub mod preprocess;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::{EmotionPrediction, RecommendationResult};
use crate::music::recommend::RecommendationEngine;
use classifier::EmotionClassifier;
use frame::Frame;
use locator::FaceLocator;

/// Detection output together with the full class distribution.
#[derive(Debug, Clone)]
pub struct Detection {
    pub prediction: EmotionPrediction,
    pub probabilities: Vec<f32>,
}

/// Wires face location, preprocessing and classification, and hands emotion
/// labels to the recommendation engine.
pub struct Orchestrator {
    locator: FaceLocator,
    classifier: EmotionClassifier,
    engine: RecommendationEngine,
}

impl Orchestrator {
    pub fn new(locator: FaceLocator, classifier: EmotionClassifier, engine: RecommendationEngine) -> Self {
        Self { locator, classifier, engine }
    }

    pub fn detect_emotion(&self, frame: &Frame) -> Result<EmotionPrediction> {
        Ok(self.detect(frame)?.prediction)
    }

    /// Stops at the first failing stage.
    pub fn detect(&self, frame: &Frame) -> Result<Detection> {
        let region = self.locator.primary_face(frame)?;
        debug!("Using face region {:?} of {}x{} frame", region, frame.width(), frame.height());
        let tensor = preprocess::normalize(&frame.crop(&region))?;
        let (prediction, probabilities) = self.classifier.predict(&tensor)?;
        info!("Detected emotion {} ({:.3})", prediction.label, prediction.confidence);
        Ok(Detection { prediction, probabilities })
    }

    pub fn recommend_from_emotion(&self, label: &str, limit: u32) -> Result<RecommendationResult> {
        self.engine.recommend(label, limit)
    }

    pub fn genre_seeds(&self) -> Result<Vec<String>> {
        self.engine.genre_seeds()
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.is_available()
    }

    pub fn detector_loaded(&self) -> bool {
        self.locator.is_available()
    }
}
