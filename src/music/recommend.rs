use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog::{CatalogClient, RecommendationQuery, SearchQuery, RECOMMENDATION_LIMIT_MAX, SEARCH_LIMIT_MAX};
use super::profile::{fallback_query, GenreProfile};
use super::token::TokenCache;
use crate::error::{EmotuneError, Result};
use crate::models::{Emotion, RecommendationResult, Track};

const EMBED_BASE: &str = "https://open.spotify.com/embed/track/";

/// Turns an emotion label into a list of catalog tracks.
pub struct RecommendationEngine {
    tokens: Arc<TokenCache>,
    catalog: Arc<dyn CatalogClient>,
    market: String,
}

impl RecommendationEngine {
    pub fn new(tokens: Arc<TokenCache>, catalog: Arc<dyn CatalogClient>, market: impl Into<String>) -> Self {
        Self { tokens, catalog, market: market.into() }
    }

    /// Genre-seeded recommendations for `emotion`, degrading to a keyword
    /// search when the seeded query fails or comes back empty.
    ///
    /// The label is validated before the token cache or the network is touched.
    pub fn recommend(&self, emotion: &str, limit: u32) -> Result<RecommendationResult> {
        let emotion: Emotion = emotion.parse()?;
        let token = self.tokens.get_token()?;
        let raw = self.fetch(emotion, &token, limit)?;

        let tracks = format_tracks(raw);
        if tracks.is_empty() {
            return Err(EmotuneError::NoRecommendations);
        }
        info!("Recommending {} tracks for {}", tracks.len(), emotion);
        Ok(RecommendationResult::new(emotion, tracks))
    }

    /// Genre tags the provider accepts as recommendation seeds.
    pub fn genre_seeds(&self) -> Result<Vec<String>> {
        let token = self.tokens.get_token()?;
        self.catalog.genre_seeds(&token).map_err(EmotuneError::CatalogUnavailable)
    }

    fn fetch(&self, emotion: Emotion, token: &str, limit: u32) -> Result<Vec<Value>> {
        let profile = GenreProfile::for_emotion(emotion);
        let query = RecommendationQuery {
            seed_genres: profile.seeds().iter().map(|g| g.to_string()).collect(),
            limit: limit.clamp(1, RECOMMENDATION_LIMIT_MAX),
            market: self.market.clone(),
            targets: profile.audio_feature_targets.iter().map(|(f, v)| (f.to_string(), *v)).collect(),
        };

        let primary = match self.catalog.recommendations(token, &query) {
            Ok(tracks) if !tracks.is_empty() => return Ok(tracks),
            Ok(_) => {
                info!("No seeded recommendations for {}, falling back to search", emotion);
                None
            }
            Err(e) => {
                warn!("Seeded recommendations for {} failed ({}), falling back to search", emotion, e);
                Some(e)
            }
        };

        let search = SearchQuery {
            q: fallback_query(emotion).to_string(),
            limit: limit.clamp(1, SEARCH_LIMIT_MAX),
            market: self.market.clone(),
        };
        self.catalog.search_tracks(token, &search).map_err(|fallback| {
            warn!("Fallback search for {} failed: {}", emotion, fallback);
            EmotuneError::RecommendationUnavailable { primary, fallback }
        })
    }
}

/// Provider track. Only `id` and the `album` object are required; every other
/// field falls back to its default when missing, null or of the wrong type.
#[derive(Deserialize)]
struct RawTrack {
    id: String,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    artists: Value,
    album: RawAlbum,
    #[serde(default)]
    preview_url: Value,
    #[serde(default)]
    external_urls: Value,
    #[serde(default)]
    duration_ms: Value,
}

#[derive(Deserialize)]
struct RawAlbum {
    #[serde(default)]
    name: Value,
    #[serde(default)]
    images: Value,
}

fn string_field(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

fn array_field(v: &Value) -> &[Value] {
    v.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn millis_field(v: &Value) -> u64 {
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        .unwrap_or(0)
}

/// Shape one provider track. Fails only when `id` or the `album` object is
/// missing or mistyped.
pub fn format_track(raw: Value) -> std::result::Result<Track, serde_json::Error> {
    let raw: RawTrack = serde_json::from_value(raw)?;
    // Nameless artists stay as "" so positions match the provider's list.
    let artists: Vec<String> = array_field(&raw.artists)
        .iter()
        .map(|a| a.get("name").and_then(string_field).unwrap_or_default())
        .collect();
    let image_url = array_field(&raw.album.images)
        .iter()
        .find_map(|i| i.get("url").and_then(string_field));
    let preview_url = string_field(&raw.preview_url);
    let has_preview = preview_url.is_some();
    Ok(Track {
        embed_url: format!("{}{}", EMBED_BASE, raw.id),
        id: raw.id,
        name: string_field(&raw.name).unwrap_or_else(|| "Unknown".to_string()),
        artist: artists.join(", "),
        artists,
        album_name: string_field(&raw.album.name).unwrap_or_default(),
        preview_url,
        external_url: raw.external_urls.get("spotify").and_then(string_field).unwrap_or_default(),
        image_url,
        duration_ms: millis_field(&raw.duration_ms),
        has_preview,
    })
}

/// Format a batch, skipping tracks that do not parse.
pub fn format_tracks(raw: Vec<Value>) -> Vec<Track> {
    let total = raw.len();
    let tracks: Vec<Track> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match format_track(value) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Skipping malformed track #{}: {}", i, e);
                None
            }
        })
        .collect();
    if tracks.len() < total {
        debug!("Formatted {}/{} tracks", tracks.len(), total);
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_track() -> Value {
        json!({
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "artists": [{"name": "Rick Astley"}, {"name": "Someone Else"}],
            "album": {
                "name": "Whenever You Need Somebody",
                "images": [{"url": "https://i.scdn.co/image/large"}, {"url": "https://i.scdn.co/image/small"}]
            },
            "preview_url": "https://p.scdn.co/mp3-preview/abc",
            "external_urls": {"spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"},
            "duration_ms": 213573
        })
    }

    #[test]
    fn test_format_full_track() {
        let t = format_track(full_track()).unwrap();
        assert_eq!(t.artists, vec!["Rick Astley", "Someone Else"]);
        assert_eq!(t.artist, "Rick Astley, Someone Else");
        assert_eq!(t.album_name, "Whenever You Need Somebody");
        assert_eq!(t.image_url.as_deref(), Some("https://i.scdn.co/image/large"));
        assert!(t.has_preview);
        assert_eq!(t.duration_ms, 213573);
        assert_eq!(t.embed_url, "https://open.spotify.com/embed/track/4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_optional_fields_default() {
        let t = format_track(json!({"id": "x1", "album": {}, "preview_url": null})).unwrap();
        assert_eq!(t.name, "Unknown");
        assert!(t.artists.is_empty());
        assert_eq!(t.artist, "");
        assert_eq!(t.image_url, None);
        assert!(!t.has_preview);
        assert_eq!(t.external_url, "");
        assert_eq!(t.duration_ms, 0);
    }

    #[test]
    fn test_missing_album_or_id_fails() {
        let mut no_album = full_track();
        no_album.as_object_mut().unwrap().remove("album");
        assert!(format_track(no_album).is_err());
        assert!(format_track(json!({"album": {}})).is_err());
        assert!(format_track(json!({"id": "x", "album": null})).is_err());
    }

    #[test]
    fn test_mistyped_optional_fields_default_per_field() {
        let mut t = full_track();
        t["artists"] = Value::Null;
        t["name"] = json!(42);
        t["duration_ms"] = json!(1000.0);
        t["preview_url"] = json!(false);
        t["external_urls"] = json!("https://open.spotify.com/track/x");
        t["album"]["images"] = Value::Null;
        let t = format_track(t).unwrap();
        assert!(t.artists.is_empty());
        assert_eq!(t.name, "Unknown");
        assert_eq!(t.duration_ms, 1000);
        assert!(!t.has_preview);
        assert_eq!(t.external_url, "");
        assert_eq!(t.image_url, None);
        assert_eq!(t.album_name, "Whenever You Need Somebody");

        let mut t = full_track();
        t["album"]["images"] = json!([{"url": null}, {"width": 64}, {"url": "https://i.scdn.co/image/third"}]);
        t["album"]["name"] = json!(["not", "a", "string"]);
        let t = format_track(t).unwrap();
        assert_eq!(t.image_url.as_deref(), Some("https://i.scdn.co/image/third"));
        assert_eq!(t.album_name, "");
    }

    #[test]
    fn test_nameless_artist_keeps_position() {
        let mut t = full_track();
        t["artists"] = json!([{"name": "First"}, {"id": "no-name"}, {"name": "Third"}]);
        let t = format_track(t).unwrap();
        assert_eq!(t.artists, vec!["First", "", "Third"]);
        assert_eq!(t.artist, "First, , Third");
    }

    #[test]
    fn test_batch_skips_malformed() {
        let mut batch: Vec<Value> = (0..4)
            .map(|i| {
                let mut t = full_track();
                t["id"] = json!(format!("id{}", i));
                t
            })
            .collect();
        batch.insert(2, json!({"id": "broken", "name": "no album"}));
        let tracks = format_tracks(batch);
        assert_eq!(tracks.len(), 4);
        assert_eq!(tracks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["id0", "id1", "id2", "id3"]);
    }
}
