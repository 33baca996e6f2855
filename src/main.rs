use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use emotune::music::{RecommendationEngine, SpotifyClient, TokenCache};
use emotune::pipeline::{classifier::EmotionClassifier, locator::FaceLocator, Orchestrator};
use emotune::utils::config::Config;
use emotune::utils::logging;
use emotune::AppState;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    logging::init();
    let cfg = Config::from_env();
    if !cfg.has_credentials() {
        warn!("SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET not set; recommendations will fail");
    }

    // reqwest's blocking client must be created outside the async runtime.
    let spotify = Arc::new(SpotifyClient::from_config(&cfg)?);
    let tokens = Arc::new(TokenCache::with_margin(spotify.clone(), Duration::from_secs(cfg.token_margin_secs)));
    let engine = RecommendationEngine::new(tokens, spotify, cfg.market.clone());

    let locator = FaceLocator::load(&cfg.detector_model_path);
    let classifier = EmotionClassifier::load(&cfg.model_path);
    let orchestrator = Arc::new(Orchestrator::new(locator, classifier, engine));
    info!(
        model_loaded = orchestrator.model_loaded(),
        detector_loaded = orchestrator.detector_loaded(),
        "pipeline ready"
    );

    let state = Arc::new(AppState::new(orchestrator.clone()));
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let app = emotune::api::routes::router(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("listening" = %addr);
        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })?;
    // Dropped after the runtime so the blocking client never shuts down on an async worker.
    drop(runtime);
    drop(orchestrator);
    Ok(())
}
