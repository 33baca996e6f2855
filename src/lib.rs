pub mod api;
pub mod error;
pub mod models;
pub mod music;
pub mod pipeline;
pub mod utils;

use std::sync::Arc;

pub use error::{CatalogError, EmotuneError, Result};

#[derive(Clone)]
pub struct AppState {
    pub started_at: std::time::Instant,
    pub orchestrator: Arc<pipeline::Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<pipeline::Orchestrator>) -> Self {
        Self { started_at: std::time::Instant::now(), orchestrator }
    }
}
