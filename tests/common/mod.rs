#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use emotune::error::CatalogError;
use emotune::music::catalog::{CatalogClient, RecommendationQuery, SearchQuery, TokenExchange, TokenGrant};
use emotune::music::{RecommendationEngine, TokenCache};
use emotune::pipeline::classifier::{EmotionClassifier, EmotionModel};
use emotune::pipeline::frame::{FaceRegion, Frame};
use emotune::pipeline::locator::{FaceDetector, FaceLocator};
use emotune::pipeline::Orchestrator;
use ndarray::Array4;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Auth exchange that counts calls and hands out `token-<n>`.
/// `lifetimes[i]` is the `expires_in` of the i-th grant; the last entry repeats.
/// Calls numbered `fail_from` and later are rejected with HTTP 401.
pub struct CountingAuth {
    pub calls: AtomicUsize,
    lifetimes: Vec<u64>,
    delay: Duration,
    fail_from: usize,
}

impl CountingAuth {
    pub fn new(expires_in: u64) -> Self {
        Self::scripted(vec![expires_in])
    }

    pub fn scripted(lifetimes: Vec<u64>) -> Self {
        Self { calls: AtomicUsize::new(0), lifetimes, delay: Duration::ZERO, fail_from: usize::MAX }
    }

    pub fn failing() -> Self {
        Self::new(3600).failing_from(0)
    }

    pub fn failing_from(mut self, call: usize) -> Self {
        self.fail_from = call;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenExchange for CountingAuth {
    fn exchange(&self) -> Result<TokenGrant, CatalogError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if n >= self.fail_from {
            return Err(CatalogError::Status(401));
        }
        let expires_in = self.lifetimes[n.min(self.lifetimes.len() - 1)];
        Ok(TokenGrant { access_token: format!("token-{}", n + 1), expires_in })
    }
}

/// Catalog returning canned responses and recording what it was asked.
pub struct ScriptedCatalog {
    pub primary: Result<Vec<Value>, CatalogError>,
    pub fallback: Result<Vec<Value>, CatalogError>,
    pub genres: Result<Vec<String>, CatalogError>,
    pub calls: AtomicUsize,
    pub last_recommendation: Mutex<Option<RecommendationQuery>>,
    pub last_search: Mutex<Option<SearchQuery>>,
}

impl ScriptedCatalog {
    pub fn new(primary: Result<Vec<Value>, CatalogError>, fallback: Result<Vec<Value>, CatalogError>) -> Self {
        Self {
            primary,
            fallback,
            genres: Ok(vec!["acoustic".to_string(), "pop".to_string(), "rock".to_string()]),
            calls: AtomicUsize::new(0),
            last_recommendation: Mutex::new(None),
            last_search: Mutex::new(None),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CatalogClient for ScriptedCatalog {
    fn recommendations(&self, _token: &str, query: &RecommendationQuery) -> Result<Vec<Value>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_recommendation.lock() = Some(query.clone());
        self.primary.clone()
    }

    fn search_tracks(&self, _token: &str, query: &SearchQuery) -> Result<Vec<Value>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock() = Some(query.clone());
        self.fallback.clone()
    }

    fn genre_seeds(&self, _token: &str) -> Result<Vec<String>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.genres.clone()
    }
}

pub fn track(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "artists": [{"name": "Artist A"}, {"name": "Artist B"}],
        "album": {"name": "Album", "images": [{"url": format!("https://img.example/{}.jpg", id)}]},
        "preview_url": null,
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)},
        "duration_ms": 180000
    })
}

pub fn tracks(n: usize) -> Vec<Value> {
    (0..n).map(|i| track(&format!("t{}", i))).collect()
}

pub fn engine(auth: Arc<CountingAuth>, catalog: Arc<ScriptedCatalog>) -> RecommendationEngine {
    RecommendationEngine::new(Arc::new(TokenCache::new(auth)), catalog, "US")
}

/// Detector that always reports the same regions and counts calls.
pub struct FixedDetector {
    pub regions: Vec<FaceRegion>,
    pub calls: AtomicUsize,
}

impl FixedDetector {
    pub fn new(regions: Vec<FaceRegion>) -> Self {
        Self { regions, calls: AtomicUsize::new(0) }
    }
}

impl FaceDetector for FixedDetector {
    fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRegion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.regions.clone()
    }
}

/// Emotion model returning fixed scores.
pub struct FixedModel {
    pub scores: Vec<f32>,
    pub calls: Arc<AtomicUsize>,
}

impl EmotionModel for FixedModel {
    fn infer(&self, _input: &Array4<f32>) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Scores peaking on `happy` (index 3).
pub fn happy_scores() -> Vec<f32> {
    vec![0.02, 0.01, 0.02, 0.85, 0.05, 0.03, 0.02]
}

pub fn classifier(scores: Vec<f32>) -> (EmotionClassifier, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = FixedModel { scores, calls: calls.clone() };
    (EmotionClassifier::from_model(Box::new(model)), calls)
}

pub fn face() -> FaceRegion {
    FaceRegion { x: 8, y: 8, width: 48, height: 48 }
}

/// Horizontal RGB gradient.
pub fn frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _y in 0..height {
        for x in 0..width {
            let v = (x * 255 / width.max(1)) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
    }
    Frame::new(data, width, height, 3).unwrap()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, image::Luma([128])));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png).unwrap();
    out
}

/// Orchestrator over stubs: one fixed face, a `happy` model, and `catalog`.
pub fn orchestrator(catalog: Arc<ScriptedCatalog>) -> Orchestrator {
    let locator = FaceLocator::new(Arc::new(FixedDetector::new(vec![face()])));
    let (classifier, _) = classifier(happy_scores());
    Orchestrator::new(locator, classifier, engine(Arc::new(CountingAuth::new(3600)), catalog))
}
