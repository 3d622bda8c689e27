//! Exploratory views over the reference dataset

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use viewcast_common::dataset::{Point, PerformanceReport, ReferenceDataset, DEFAULT_PREVIEW_ROWS};

use crate::api::batch::BatchJsonResponse;
use crate::{ApiError, ApiResult, AppState};

/// Upper bound on preview size
pub const MAX_PREVIEW_ROWS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub rows: Option<usize>,
}

fn dataset(state: &AppState) -> ApiResult<&ReferenceDataset> {
    state
        .dataset
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("reference dataset not loaded".to_string()))
}

/// GET /api/dataset/preview?rows=n
pub async fn preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<Json<BatchJsonResponse>> {
    let rows = query
        .rows
        .unwrap_or(DEFAULT_PREVIEW_ROWS)
        .min(MAX_PREVIEW_ROWS);
    Ok(Json(dataset(&state)?.preview(rows).into()))
}

/// GET /api/eda/likes-views
pub async fn likes_views(State(state): State<AppState>) -> ApiResult<Json<Vec<Point>>> {
    Ok(Json(dataset(&state)?.likes_vs_views()?))
}

/// GET /api/eda/performance
///
/// Actual vs predicted views over the reference dataset, with error metrics.
pub async fn performance(State(state): State<AppState>) -> ApiResult<Json<PerformanceReport>> {
    Ok(Json(dataset(&state)?.performance(&state.model)?))
}

/// Build exploratory view routes
pub fn eda_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dataset/preview", get(preview))
        .route("/api/eda/likes-views", get(likes_views))
        .route("/api/eda/performance", get(performance))
}
