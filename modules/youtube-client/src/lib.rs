pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::VideoComment;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use types::{CommentThreadsResponse, ErrorEnvelope, SearchResponse};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The API caps `maxResults` at 50 for search and 100 for comment threads.
const MAX_SEARCH_RESULTS: u32 = 50;
const MAX_COMMENT_RESULTS: u32 = 100;

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Most recent videos matching `query`. Returns video ids only.
    pub async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        tracing::debug!(query, max_results, "Searching videos");
        let max = max_results.min(MAX_SEARCH_RESULTS).to_string();
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", max.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = check_status(resp, None).await?.text().await?;
        let search: SearchResponse = serde_json::from_str(&body)?;
        Ok(search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .filter(|id| !id.is_empty())
            .collect())
    }

    /// Top-level comments of a video, most relevant first, as plain text.
    pub async fn top_level_comments(&self, video_id: &str, max_results: u32) -> Result<Vec<VideoComment>> {
        tracing::debug!(video_id, max_results, "Fetching comment threads");
        let max = max_results.min(MAX_COMMENT_RESULTS).to_string();
        let resp = self
            .client
            .get(format!("{}/commentThreads", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("videoId", video_id),
                ("order", "relevance"),
                ("textFormat", "plainText"),
                ("maxResults", max.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = check_status(resp, Some(video_id)).await?.text().await?;
        let threads: CommentThreadsResponse = serde_json::from_str(&body)?;
        Ok(threads
            .items
            .into_iter()
            .map(|thread| thread.into_comment(video_id))
            .collect())
    }
}

async fn check_status(resp: Response, video_id: Option<&str>) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_error(status, &body, video_id))
}

/// Map a non-success response onto the error variants callers branch on.
/// YouTube reports throttling and quota exhaustion as 403 with a reason code.
fn classify_error(status: StatusCode, body: &str, video_id: Option<&str>) -> YouTubeError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reason = envelope
        .as_ref()
        .and_then(|e| e.error.errors.first())
        .map(|d| d.reason.clone())
        .filter(|r| !r.is_empty());
    let message = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match (status, reason.as_deref()) {
        (StatusCode::TOO_MANY_REQUESTS, _) => YouTubeError::RateLimited(message),
        (_, Some("rateLimitExceeded" | "userRateLimitExceeded")) => {
            YouTubeError::RateLimited(message)
        }
        (_, Some("quotaExceeded" | "dailyLimitExceeded")) => YouTubeError::QuotaExceeded(message),
        (_, Some("commentsDisabled")) => {
            YouTubeError::CommentsDisabled(video_id.unwrap_or_default().to_string())
        }
        _ => YouTubeError::Api {
            status: status.as_u16(),
            reason,
            message,
        },
    }
}
