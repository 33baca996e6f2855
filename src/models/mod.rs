pub mod emotion;
pub mod track;

pub use emotion::{Emotion, EmotionPrediction};
pub use track::{RecommendationResult, Track};
