use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Daily quota is spent; retrying within the same day will not help.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Comments are disabled for video {0}")]
    CommentsDisabled(String),

    #[error("API error (status {status}, reason {reason:?}): {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl YouTubeError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, YouTubeError::RateLimited(_))
    }
}

/// The request URL carries the API key, so it is stripped before the error
/// can reach a log line or a cycle result.
impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::Parse(err.to_string())
    }
}
