use std::sync::Arc;
use axum::{body::Bytes, extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use crate::AppState;
use crate::error::{EmotuneError, Result};
use crate::models::Emotion;
use crate::pipeline::{frame::Frame, Detection};

impl IntoResponse for EmotuneError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Run a blocking orchestrator call off the async workers and render its result.
async fn run_blocking<T, F>(f: F) -> Response
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!("Blocking task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "Task error", "retryable": false}))).into_response()
        }
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.orchestrator.model_loaded(),
        "detector_loaded": state.orchestrator.detector_loaded(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    });
    (StatusCode::OK, Json(body))
}

#[derive(Serialize)]
pub struct DetectionResponse {
    pub emotion: Emotion,
    pub confidence: f32,
    pub probabilities: serde_json::Map<String, serde_json::Value>,
}

impl From<Detection> for DetectionResponse {
    fn from(d: Detection) -> Self {
        let probabilities = Emotion::ALL
            .iter()
            .zip(d.probabilities)
            .map(|(e, p)| (e.as_str().to_string(), serde_json::json!(p)))
            .collect();
        Self { emotion: d.prediction.label, confidence: d.prediction.confidence, probabilities }
    }
}

pub async fn detect_image(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    run_blocking(move || {
        let frame = Frame::decode(&body)?;
        orchestrator.detect(&frame).map(DetectionResponse::from)
    })
    .await
}

#[derive(Deserialize)]
pub struct WebcamRequest {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image: String,
}

pub async fn detect_webcam(State(state): State<Arc<AppState>>, Json(req): Json<WebcamRequest>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    run_blocking(move || {
        let frame = Frame::from_data_url(&req.image)?;
        orchestrator.detect(&frame).map(DetectionResponse::from)
    })
    .await
}

fn default_limit() -> u32 {
    20
}

#[derive(Deserialize)]
pub struct RecommendRequest {
    pub emotion: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub async fn recommend(State(state): State<Arc<AppState>>, Json(req): Json<RecommendRequest>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    run_blocking(move || orchestrator.recommend_from_emotion(&req.emotion, req.limit)).await
}

pub async fn genres(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    run_blocking(move || orchestrator.genre_seeds().map(|genres| serde_json::json!({ "genres": genres }))).await
}
