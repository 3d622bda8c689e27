//! Live statistics lookup for a video URL
//!
//! URL → identifier (strategy chain) → remote lookup → optional prediction.
//! A single attempt per request; upstream failures map to distinct error codes.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use viewcast_common::features::MAX_UPLOAD_HOUR;
use viewcast_common::FeatureVector;

use crate::api::predict::{predict_one, PredictResponse};
use crate::services::LiveStats;
use crate::{ApiError, ApiResult, AppState};

/// Lookup request
#[derive(Debug, Deserialize)]
pub struct LiveStatsRequest {
    /// Video URL or bare identifier
    pub url: String,
}

/// Lookup-and-predict request
#[derive(Debug, Deserialize)]
pub struct LivePredictRequest {
    pub url: String,
    /// Overrides the hour derived from the publish time
    pub upload_hour: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LivePredictResponse {
    pub stats: LiveStats,
    pub prediction: PredictResponse,
}

async fn lookup(state: &AppState, url: &str) -> ApiResult<LiveStats> {
    let video_id = state.extractor.extract(url)?;
    Ok(state.stats_source.fetch(&video_id).await?)
}

/// POST /api/live-stats
///
/// **Request:** `{"url": "https://www.youtube.com/watch?v=..."}`
///
/// **Errors:**
/// - 400: no identifier in the URL
/// - 404: the platform has no such video
/// - 429: API quota exhausted
/// - 502: transport, authentication, or unexpected upstream response
pub async fn live_stats(
    State(state): State<AppState>,
    payload: Result<Json<LiveStatsRequest>, JsonRejection>,
) -> ApiResult<Json<LiveStats>> {
    let Json(request) = payload?;
    Ok(Json(lookup(&state, &request.url).await?))
}

/// POST /api/live-predict
///
/// Fetches live stats, then predicts with them. The upload hour comes from
/// the request, else from the publish time.
pub async fn live_predict(
    State(state): State<AppState>,
    payload: Result<Json<LivePredictRequest>, JsonRejection>,
) -> ApiResult<Json<LivePredictResponse>> {
    let Json(request) = payload?;

    if let Some(hour) = request.upload_hour {
        if hour > MAX_UPLOAD_HOUR {
            return Err(ApiError::BadRequest(format!(
                "upload_hour must be between 0 and {}, got {}",
                MAX_UPLOAD_HOUR, hour
            )));
        }
    }

    let stats = lookup(&state, &request.url).await?;
    let upload_hour = request.upload_hour.or(stats.upload_hour).ok_or_else(|| {
        ApiError::BadRequest("upload_hour not given and publish time unavailable".to_string())
    })?;

    let features =
        FeatureVector::build(stats.likes, stats.comments, stats.duration_minutes, upload_hour);
    features.check_ranges()?;
    let prediction = predict_one(&state, features);

    Ok(Json(LivePredictResponse { stats, prediction }))
}

/// Build live lookup routes
pub fn live_routes() -> Router<AppState> {
    Router::new()
        .route("/api/live-stats", post(live_stats))
        .route("/api/live-predict", post(live_predict))
}
