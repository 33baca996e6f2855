use serde::{Deserialize, Serialize};

use super::emotion::Emotion;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    /// `artists` joined with ", ".
    pub artist: String,
    #[serde(rename = "album")]
    pub album_name: String,
    pub preview_url: Option<String>,
    #[serde(rename = "spotify_url")]
    pub external_url: String,
    #[serde(rename = "spotify_embed_url")]
    pub embed_url: String,
    pub image_url: Option<String>,
    pub duration_ms: u64,
    pub has_preview: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecommendationResult {
    pub emotion: Emotion,
    pub tracks: Vec<Track>,
    pub count: usize,
}

impl RecommendationResult {
    pub fn new(emotion: Emotion, tracks: Vec<Track>) -> Self {
        let count = tracks.len();
        Self { emotion, tracks, count }
    }
}
