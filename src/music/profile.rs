use crate::models::Emotion;

/// Maximum seed genres the provider accepts per recommendation request.
pub const MAX_SEED_GENRES: usize = 5;

/// Catalog bias for one emotion: seed genres plus audio-feature targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreProfile {
    pub seed_genres: &'static [&'static str],
    /// `(feature, target)` pairs, sent as `target_<feature>`.
    pub audio_feature_targets: &'static [(&'static str, f32)],
}

impl GenreProfile {
    pub fn for_emotion(emotion: Emotion) -> GenreProfile {
        match emotion {
            Emotion::Happy => GenreProfile {
                seed_genres: &["pop", "dance", "party"],
                audio_feature_targets: &[("valence", 0.8), ("energy", 0.7)],
            },
            Emotion::Sad => GenreProfile {
                seed_genres: &["acoustic", "piano", "sad"],
                audio_feature_targets: &[("valence", 0.3), ("energy", 0.4)],
            },
            Emotion::Angry => GenreProfile {
                seed_genres: &["rock", "metal", "punk"],
                audio_feature_targets: &[("energy", 0.9)],
            },
            Emotion::Fear => GenreProfile {
                seed_genres: &["ambient", "chill", "indie"],
                audio_feature_targets: &[("valence", 0.5), ("energy", 0.5)],
            },
            Emotion::Surprise => GenreProfile {
                seed_genres: &["electronic", "edm", "dance"],
                audio_feature_targets: &[("energy", 0.8)],
            },
            Emotion::Disgust => GenreProfile {
                seed_genres: &["grunge", "alternative", "rock"],
                audio_feature_targets: &[],
            },
            Emotion::Neutral => GenreProfile {
                seed_genres: &["indie", "alternative", "pop"],
                audio_feature_targets: &[("valence", 0.5), ("energy", 0.5)],
            },
        }
    }

    /// Seed genres capped at the provider limit.
    pub fn seeds(&self) -> &'static [&'static str] {
        &self.seed_genres[..self.seed_genres.len().min(MAX_SEED_GENRES)]
    }
}

/// Free-text query for the degraded keyword search.
pub fn fallback_query(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "happy upbeat positive",
        Emotion::Sad => "sad emotional melancholy",
        Emotion::Angry => "rock energetic intense",
        Emotion::Fear => "calm peaceful ambient",
        Emotion::Surprise => "electronic dance party",
        Emotion::Disgust => "alternative indie rock",
        Emotion::Neutral => "chill indie alternative",
    }
}
