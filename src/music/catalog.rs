//! Blocking client for the Spotify Web API endpoints the recommender uses.
//!
//! Only the calls the engine needs are covered: the client-credentials token
//! exchange, genre-seeded recommendations, track keyword search and the list
//! of available genre seeds. Track payloads are returned as raw JSON values so
//! one malformed track can be skipped without rejecting the whole response.

use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::CatalogError;
use crate::utils::config::Config;

/// Provider cap on `limit` for the recommendations endpoint.
pub const RECOMMENDATION_LIMIT_MAX: u32 = 100;
/// Provider cap on `limit` for the search endpoint.
pub const SEARCH_LIMIT_MAX: u32 = 50;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Performs the client-credentials exchange.
pub trait TokenExchange: Send + Sync {
    fn exchange(&self) -> Result<TokenGrant, CatalogError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub seed_genres: Vec<String>,
    pub limit: u32,
    pub market: String,
    /// `(feature, target)`; sent as `target_<feature>`.
    pub targets: Vec<(String, f32)>,
}

impl RecommendationQuery {
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("seed_genres".to_string(), self.seed_genres.join(",")),
            ("limit".to_string(), self.limit.to_string()),
            ("market".to_string(), self.market.clone()),
        ];
        for (feature, target) in &self.targets {
            params.push((format!("target_{}", feature), target.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub q: String,
    pub limit: u32,
    pub market: String,
}

impl SearchQuery {
    pub fn params(&self) -> Vec<(String, String)> {
        vec![
            ("q".to_string(), self.q.clone()),
            ("type".to_string(), "track".to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("market".to_string(), self.market.clone()),
        ]
    }
}

/// Bearer-authorized catalog queries.
pub trait CatalogClient: Send + Sync {
    fn recommendations(&self, token: &str, query: &RecommendationQuery) -> Result<Vec<Value>, CatalogError>;
    fn search_tracks(&self, token: &str, query: &SearchQuery) -> Result<Vec<Value>, CatalogError>;
    fn genre_seeds(&self, token: &str) -> Result<Vec<String>, CatalogError>;
}

#[derive(Deserialize)]
struct TrackList {
    #[serde(default)]
    tracks: Vec<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct GenreSeeds {
    #[serde(default)]
    genres: Vec<String>,
}

pub struct SpotifyClient {
    client: Client,
    auth_url: String,
    api_base: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyClient {
    pub fn from_config(cfg: &Config) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            auth_url: cfg.auth_url.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            client_id: cfg.spotify_client_id.clone(),
            client_secret: cfg.spotify_client_secret.clone(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, token: &str, params: &[(String, String)]) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.api_base, path);
        let response = self.client.get(&url).bearer_auth(token).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(response.json::<T>()?)
    }
}

impl TokenExchange for SpotifyClient {
    fn exchange(&self) -> Result<TokenGrant, CatalogError> {
        let credentials = general_purpose::STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(&self.auth_url)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(response.json::<TokenGrant>()?)
    }
}

impl CatalogClient for SpotifyClient {
    fn recommendations(&self, token: &str, query: &RecommendationQuery) -> Result<Vec<Value>, CatalogError> {
        let body: TrackList = self.get("/recommendations", token, &query.params())?;
        Ok(body.tracks)
    }

    fn search_tracks(&self, token: &str, query: &SearchQuery) -> Result<Vec<Value>, CatalogError> {
        let body: SearchResponse = self.get("/search", token, &query.params())?;
        Ok(body.tracks.map(|p| p.items).unwrap_or_default())
    }

    fn genre_seeds(&self, token: &str) -> Result<Vec<String>, CatalogError> {
        let body: GenreSeeds = self.get("/recommendations/available-genre-seeds", token, &[])?;
        Ok(body.genres)
    }
}
