pub mod handlers;
pub mod templates;

use crate::api::LineFeedClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::Dataset;
use crate::parser::parse_matches;
use crate::utils::data::{ensure_data_dir, latest_artifact, load_artifact, load_raw_payload};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Shared state for every handler.
///
/// The dataset is replaced wholesale after each successful fetch and is
/// never mutated in place; readers take a cheap clone of the `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Arc<LineFeedClient>,
    dataset: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl AppState {
    pub fn new(config: AppConfig, client: LineFeedClient, initial: Option<Dataset>) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            dataset: Arc::new(RwLock::new(initial.map(Arc::new))),
        }
    }

    /// Current dataset, if one has been loaded
    pub async fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().await.clone()
    }

    pub async fn replace_dataset(&self, dataset: Dataset) {
        *self.dataset.write().await = Some(Arc::new(dataset));
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(templates::dashboard))
        .route("/api/fetch-live", post(handlers::fetch_live))
        .route("/api/summary", get(handlers::summary))
        .route("/api/matches", get(handlers::matches))
        .route("/api/match/:id", get(handlers::match_by_id))
        .route("/api/leagues", get(handlers::leagues))
        .route("/api/export/:format", get(handlers::export_dataset))
        .with_state(state)
}

/// Dataset to serve before the first fetch: the newest artifact, else the
/// sample payload, else nothing.
pub fn load_initial_dataset(config: &AppConfig) -> Result<Option<Dataset>> {
    let sample_path = ensure_data_dir(&config.data_dir)?;

    if let Some(path) = latest_artifact(&config.data_dir)? {
        match load_artifact(&path) {
            Ok(records) => {
                info!(path = %path.display(), records = records.len(), "loaded latest artifact");
                return Ok(Some(Dataset::new(records, path.display().to_string())));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not load artifact"),
        }
    }

    let parsed = load_raw_payload(&sample_path)
        .and_then(|payload| parse_matches(&payload, config.default_sport_id));
    match parsed {
        Ok(records) => {
            info!(path = %sample_path.display(), records = records.len(), "loaded sample data");
            Ok(Some(Dataset::new(records, sample_path.display().to_string())))
        }
        Err(e) => {
            warn!(error = %e, "no usable sample data; use /api/fetch-live to load data");
            Ok(None)
        }
    }
}
