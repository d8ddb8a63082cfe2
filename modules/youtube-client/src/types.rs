use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- search.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

// --- commentThreads.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThreadsResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSnippet {
    #[serde(rename = "authorDisplayName", default)]
    pub author_display_name: String,
    #[serde(rename = "textDisplay", default)]
    pub text_display: String,
    #[serde(rename = "textOriginal")]
    pub text_original: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

// --- error envelope ---

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}

/// A top-level comment flattened out of its thread.
#[derive(Debug, Clone)]
pub struct VideoComment {
    pub id: String,
    pub video_id: String,
    pub author: String,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl CommentThread {
    /// Flatten into a `VideoComment`. Prefers the original text over the
    /// display text, which may carry markup.
    pub fn into_comment(self, video_id: &str) -> VideoComment {
        let top = self.snippet.top_level_comment;
        let text = top
            .snippet
            .text_original
            .filter(|t| !t.is_empty())
            .unwrap_or(top.snippet.text_display);
        VideoComment {
            id: top.id,
            video_id: self.snippet.video_id.unwrap_or_else(|| video_id.to_string()),
            author: top.snippet.author_display_name,
            text,
            published_at: top.snippet.published_at,
        }
    }
}
