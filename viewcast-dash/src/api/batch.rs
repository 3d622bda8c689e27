//! Batch scoring of uploaded CSV files

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use viewcast_common::{batch, BatchTable};

use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the CSV upload
pub const UPLOAD_FIELD: &str = "file";

/// Download name for scored CSV output
pub const OUTPUT_FILENAME: &str = "predicted_views.csv";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Scored table as JSON
#[derive(Debug, Serialize)]
pub struct BatchJsonResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
}

impl From<BatchTable> for BatchJsonResponse {
    fn from(table: BatchTable) -> Self {
        Self {
            row_count: table.row_count(),
            columns: table.columns().to_vec(),
            rows: table.rows().to_vec(),
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::BadRequest(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

/// POST /api/batch?format=csv|json
///
/// **Request:** multipart/form-data with a `file` field holding a CSV that
/// has at least `likes`, `comments`, `duration_minutes`, `upload_hour`.
///
/// **Response:** the input table plus a `Predicted_Views` column, as a CSV
/// attachment (default) or JSON.
///
/// **Errors:**
/// - 400: no file field, unreadable CSV
/// - 422: missing columns, empty or non-numeric feature cells
pub async fn score_upload(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let bytes = read_upload(multipart).await?;
    tracing::debug!(bytes = bytes.len(), "Received batch upload");

    let table = BatchTable::from_csv_bytes(&bytes)?;
    let scored = batch::score(&table, &[], &state.model)?;

    match query.format {
        OutputFormat::Json => Ok(Json(BatchJsonResponse::from(scored)).into_response()),
        OutputFormat::Csv => {
            let body = scored.to_csv_bytes()?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", OUTPUT_FILENAME),
                    ),
                ],
                body,
            )
                .into_response())
        }
    }
}

/// Build batch scoring routes
pub fn batch_routes() -> Router<AppState> {
    Router::new().route("/api/batch", post(score_upload))
}
