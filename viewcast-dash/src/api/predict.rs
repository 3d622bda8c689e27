//! Single prediction from manual input
//!
//! These handlers stand in for the bounded input widgets: they range-check
//! manual input before it reaches the (non-validating) feature builder.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use viewcast_common::{duration, FeatureVector};

use crate::{ApiResult, AppState};

/// Manual prediction input
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub likes: u64,
    pub comments: u64,
    pub duration_minutes: f64,
    pub upload_hour: u32,
}

/// Single prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Truncated whole-view estimate
    pub predicted_views: u64,
    /// Model output before truncation
    pub raw_prediction: f64,
    pub features: FeatureVector,
    pub model: String,
}

/// Duration conversion request
#[derive(Debug, Deserialize)]
pub struct DurationRequest {
    /// ISO-8601 duration, e.g. `PT10M30S`
    pub duration: String,
}

#[derive(Debug, Serialize)]
pub struct DurationResponse {
    pub duration: String,
    pub duration_minutes: f64,
}

/// Score one checked feature vector
pub(crate) fn predict_one(state: &AppState, features: FeatureVector) -> PredictResponse {
    let raw_prediction = state.model.predict(&features);
    let predicted_views = state.model.predict_views(&features).views();

    tracing::info!(
        likes = features.likes,
        comments = features.comments,
        duration_minutes = features.duration_minutes,
        upload_hour = features.upload_hour,
        predicted_views,
        "Single prediction"
    );

    PredictResponse {
        predicted_views,
        raw_prediction,
        features,
        model: state.model.display_name().to_string(),
    }
}

/// POST /api/predict
///
/// **Request:** `{"likes": 100, "comments": 10, "duration_minutes": 10, "upload_hour": 12}`
///
/// **Errors:**
/// - 400 Bad Request: malformed body, negative counts, hour outside 0-23
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let Json(request) = payload?;

    let features = FeatureVector::build(
        request.likes,
        request.comments,
        request.duration_minutes,
        request.upload_hour,
    );
    features.check_ranges()?;

    Ok(Json(predict_one(&state, features)))
}

/// POST /api/duration
///
/// Converts an ISO-8601 duration into minutes (2 decimals).
pub async fn convert_duration(
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> ApiResult<Json<DurationResponse>> {
    let Json(request) = payload?;
    let duration_minutes = duration::normalize(&request.duration)?;

    Ok(Json(DurationResponse {
        duration: request.duration,
        duration_minutes,
    }))
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/duration", post(convert_duration))
}
