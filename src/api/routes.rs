use axum::{Router, extract::DefaultBodyLimit, routing::{get, post}};
use std::sync::Arc;
use tower_http::cors::{CorsLayer, AllowOrigin};
use axum::http::Method;
use crate::AppState;
use crate::api::handlers;

/// Webcam captures arrive base64-encoded and can exceed axum's 2 MB default.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT]);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/emotion/detect-image", post(handlers::detect_image))
        .route("/api/emotion/detect-webcam", post(handlers::detect_webcam))
        .route("/api/music/recommend", post(handlers::recommend))
        .route("/api/music/genres", get(handlers::genres))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}
