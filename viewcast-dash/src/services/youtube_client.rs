//! YouTube Data API client
//!
//! Live engagement statistics for a single video: like/comment counts, the
//! ISO-8601 duration, and publish time. One attempt per lookup; no retry or
//! backoff. Auth, quota, not-found and transport failures come back as
//! distinct [`StatsError`] variants.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use viewcast_common::duration;

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const USER_AGENT: &str = concat!("viewcast/", env!("CARGO_PKG_VERSION"));
const VIDEO_PARTS: &str = "snippet,statistics,contentDetails";

/// Error reasons the API reports when the key's quota is spent
const QUOTA_REASONS: [&str; 4] = [
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

/// Live stats lookup errors
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Malformed duration or identifier in the lookup
    #[error(transparent)]
    InvalidData(#[from] viewcast_common::Error),
}

/// Engagement counts for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStats {
    pub video_id: String,
    pub title: Option<String>,
    pub likes: u64,
    /// 0 when comments are disabled
    pub comments: u64,
    pub views: Option<u64>,
    /// Raw ISO-8601 token as reported
    pub duration: String,
    pub duration_minutes: f64,
    pub published_at: Option<DateTime<Utc>>,
    /// Hour of `published_at` (UTC)
    pub upload_hour: Option<u32>,
}

/// Source of live statistics
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Look up one video by identifier
    async fn fetch(&self, video_id: &str) -> Result<LiveStats, StatsError>;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

/// Counts arrive as decimal strings
#[derive(Debug, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "commentCount")]
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Turn a `videos.list` response body into stats.
///
/// An empty `items` list means the identifier matched nothing.
pub fn parse_videos_response(video_id: &str, body: &str) -> Result<LiveStats, StatsError> {
    let response: VideoListResponse =
        serde_json::from_str(body).map_err(|e| StatsError::ParseError(e.to_string()))?;

    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| StatsError::VideoNotFound(video_id.to_string()))?;

    let statistics = item
        .statistics
        .ok_or_else(|| StatsError::ParseError("response has no statistics".to_string()))?;
    let duration_token = item
        .content_details
        .and_then(|c| c.duration)
        .ok_or_else(|| StatsError::ParseError("response has no duration".to_string()))?;

    let likes = match parse_count("likeCount", statistics.like_count.as_deref())? {
        Some(likes) => likes,
        None => {
            tracing::warn!(video_id = %item.id, "Like count hidden, using 0");
            0
        }
    };
    let comments = parse_count("commentCount", statistics.comment_count.as_deref())?.unwrap_or(0);
    let views = parse_count("viewCount", statistics.view_count.as_deref())?;

    let duration_minutes = duration::normalize(&duration_token)?;
    let (title, published_at) = match item.snippet {
        Some(snippet) => (snippet.title, snippet.published_at),
        None => (None, None),
    };

    Ok(LiveStats {
        video_id: item.id,
        title,
        likes,
        comments,
        views,
        duration: duration_token,
        duration_minutes,
        upload_hour: published_at.map(|t| t.hour()),
        published_at,
    })
}

/// Map a non-success status and its body to an error
pub fn classify_error(status: u16, body: &str) -> StatsError {
    let (message, reasons) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope.error.message,
            envelope
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (body.to_string(), Vec::new()),
    };

    let has_reason = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(&r.as_str()));

    if has_reason(&QUOTA_REASONS) || status == 429 {
        StatsError::QuotaExceeded(message)
    } else if status == 401 || status == 403 || has_reason(&["keyInvalid", "keyExpired"]) {
        StatsError::AuthenticationFailed(message)
    } else if status == 404 {
        StatsError::VideoNotFound(message)
    } else {
        StatsError::ApiError(status, message)
    }
}

fn parse_count(field: &str, raw: Option<&str>) -> Result<Option<u64>, StatsError> {
    raw.map(|v| {
        v.trim()
            .parse::<u64>()
            .map_err(|_| StatsError::ParseError(format!("{} {:?} is not a count", field, v)))
    })
    .transpose()
}

// ============================================================================
// Client
// ============================================================================

/// YouTube Data API v3 client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, StatsError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StatsError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: YOUTUBE_BASE_URL.to_string(),
        })
    }

    /// Point the client at another endpoint (local stubs)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl StatsSource for YouTubeClient {
    async fn fetch(&self, video_id: &str) -> Result<LiveStats, StatsError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            StatsError::AuthenticationFailed("no API key configured (set VIEWCAST_API_KEY)".to_string())
        })?;

        let url = format!("{}/videos", self.base_url);
        tracing::debug!(video_id = %video_id, url = %url, "Querying YouTube Data API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("part", VIDEO_PARTS), ("id", video_id), ("key", api_key)])
            .send()
            .await
            .map_err(|e| StatsError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StatsError::NetworkError(e.without_url().to_string()))?;

        if !status.is_success() {
            let error = classify_error(status.as_u16(), &body);
            tracing::warn!(video_id = %video_id, status = status.as_u16(), error = %error, "YouTube lookup failed");
            return Err(error);
        }

        let stats = parse_videos_response(video_id, &body)?;

        tracing::info!(
            video_id = %stats.video_id,
            likes = stats.likes,
            comments = stats.comments,
            duration_minutes = stats.duration_minutes,
            "Retrieved live stats"
        );

        Ok(stats)
    }
}
