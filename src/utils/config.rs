use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub detector_model_path: PathBuf,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub auth_url: String,
    pub api_base: String,
    pub market: String,
    pub http_timeout_secs: u64,
    pub token_margin_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("EMOTUNE_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000);
        let model_path = env::var("EMOTUNE_MODEL_PATH")
            .unwrap_or_else(|_| "ml/models/emotion_detection_model.onnx".to_string());
        let detector_model_path = env::var("EMOTUNE_DETECTOR_MODEL_PATH")
            .unwrap_or_else(|_| "ml/models/seeta_fd_frontal_v1.0.bin".to_string());
        let spotify_client_id = env::var("SPOTIFY_CLIENT_ID").unwrap_or_default();
        let spotify_client_secret = env::var("SPOTIFY_CLIENT_SECRET").unwrap_or_default();
        let auth_url = env::var("EMOTUNE_AUTH_URL")
            .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string());
        let api_base = env::var("EMOTUNE_API_BASE").unwrap_or_else(|_| "https://api.spotify.com/v1".to_string());
        let market = env::var("EMOTUNE_MARKET").unwrap_or_else(|_| "US".to_string());
        let http_timeout_secs = env::var("EMOTUNE_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        let token_margin_secs = env::var("EMOTUNE_TOKEN_MARGIN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60);
        Self {
            port,
            model_path: PathBuf::from(model_path),
            detector_model_path: PathBuf::from(detector_model_path),
            spotify_client_id,
            spotify_client_secret,
            auth_url,
            api_base,
            market,
            http_timeout_secs,
            token_margin_secs,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }
}
