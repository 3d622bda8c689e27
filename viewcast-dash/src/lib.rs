//! viewcast-dash library - view-count prediction dashboard
//!
//! Thin HTTP layer over `viewcast-common`: single, live and batch
//! predictions plus exploratory views of the reference dataset.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;
use viewcast_common::dataset::ReferenceDataset;
use viewcast_common::video_id::IdentifierExtractor;
use viewcast_common::ModelArtifact;

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::services::StatsSource;

/// Application state shared across HTTP handlers
///
/// Everything here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Pre-trained predictor
    pub model: Arc<ModelArtifact>,
    /// Reference dataset for exploratory views (optional)
    pub dataset: Option<Arc<ReferenceDataset>>,
    /// Live statistics lookup
    pub stats_source: Arc<dyn StatsSource>,
    /// URL → video identifier strategies
    pub extractor: Arc<IdentifierExtractor>,
    /// Upload size limit for batch scoring
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(model: Arc<ModelArtifact>, stats_source: Arc<dyn StatsSource>) -> Self {
        Self {
            model,
            dataset: None,
            stats_source,
            extractor: Arc::new(IdentifierExtractor::default()),
            max_upload_bytes: viewcast_common::config::DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_dataset(mut self, dataset: ReferenceDataset) -> Self {
        self.dataset = Some(Arc::new(dataset));
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::predict_routes())
        .merge(api::live_routes())
        .merge(api::batch_routes())
        .merge(api::eda_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
