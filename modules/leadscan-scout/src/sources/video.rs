use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use leadscan_common::{Candidate, ScanConfig, Source};
use youtube_client::{VideoComment, YouTubeClient, YouTubeError};

use super::{FetchBatch, FetchError, FetchPlan, Readiness, RequestBudget, RetryError, SourceAdapter};

#[async_trait]
pub trait VideoCommentApi: Send + Sync {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>, YouTubeError>;

    async fn top_level_comments(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<VideoComment>, YouTubeError>;
}

#[async_trait]
impl VideoCommentApi for YouTubeClient {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>, YouTubeError> {
        YouTubeClient::search_videos(self, query, max_results).await
    }

    async fn top_level_comments(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<VideoComment>, YouTubeError> {
        YouTubeClient::top_level_comments(self, video_id, max_results).await
    }
}

/// Top-level comments on recent videos matching each search query.
/// Without an API key the adapter reports itself disabled.
pub struct VideoCommentAdapter {
    api: Option<Arc<dyn VideoCommentApi>>,
    budget: RequestBudget,
    videos_per_query: u32,
}

impl VideoCommentAdapter {
    pub fn new(api: Option<Arc<dyn VideoCommentApi>>, config: &ScanConfig) -> Self {
        Self {
            api,
            budget: RequestBudget::from_config(&config.budget),
            videos_per_query: config.video.videos_per_query,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Result<Self, YouTubeError> {
        let api: Option<Arc<dyn VideoCommentApi>> = match &config.video.api_key {
            Some(key) => Some(Arc::new(YouTubeClient::new(
                key.clone(),
                config.budget.request_timeout(),
            )?)),
            None => None,
        };
        Ok(Self::new(api, config))
    }
}

#[async_trait]
impl SourceAdapter for VideoCommentAdapter {
    fn source(&self) -> Source {
        Source::VideoComment
    }

    fn readiness(&self) -> Readiness {
        match self.api {
            Some(_) => Readiness::Ready,
            None => Readiness::Disabled {
                reason: "YOUTUBE_API_KEY not set".to_string(),
            },
        }
    }

    fn plan(&self, config: &ScanConfig) -> FetchPlan {
        FetchPlan {
            containers: config.video.queries.clone(),
            per_container_limit: config.video.comments_per_video,
        }
    }

    async fn fetch(&self, containers: &[String], per_container_limit: u32) -> FetchBatch {
        let mut batch = FetchBatch::default();
        let Some(api) = &self.api else {
            return batch;
        };

        let mut seen_videos = HashSet::new();
        let mut seen_comments = HashSet::new();
        // Once the daily quota is gone every further call fails the same way.
        let mut quota_spent: Option<FetchError> = None;

        for query in containers {
            batch.containers_attempted += 1;
            if let Some(error) = &quota_spent {
                batch.fail_container(query, error.clone());
                continue;
            }

            let videos = match self
                .budget
                .call("video.search", || api.search_videos(query, self.videos_per_query))
                .await
            {
                Ok(videos) => videos,
                Err(e) => {
                    warn!(query = query.as_str(), error = %e, "Video search failed");
                    let quota = matches!(&e, RetryError::Failed(YouTubeError::QuotaExceeded(_)));
                    let error = FetchError::from(e);
                    if quota {
                        quota_spent = Some(error.clone());
                    }
                    batch.fail_container(query, error);
                    continue;
                }
            };

            let before = batch.candidates.len();
            let observed_at = Utc::now();
            // Comment fetches that got an answer (disabled counts) vs. errored.
            let mut answered = 0usize;
            let mut errored = 0usize;

            for video_id in videos {
                if video_id.is_empty() || !seen_videos.insert(video_id.clone()) {
                    continue;
                }

                let comments = self
                    .budget
                    .call("video.comments", || {
                        api.top_level_comments(&video_id, per_container_limit)
                    })
                    .await;
                let comments = match comments {
                    Ok(comments) => {
                        answered += 1;
                        comments
                    }
                    Err(RetryError::Failed(YouTubeError::CommentsDisabled(_))) => {
                        debug!(video_id = video_id.as_str(), "Comments disabled, skipping");
                        answered += 1;
                        continue;
                    }
                    Err(e) => {
                        errored += 1;
                        warn!(query = query.as_str(), video_id = video_id.as_str(), error = %e, "Video comments failed");
                        let quota = matches!(&e, RetryError::Failed(YouTubeError::QuotaExceeded(_)));
                        let error = FetchError::from(e);
                        if quota {
                            quota_spent = Some(error.clone());
                        }
                        batch.partial_error(query, Some(video_id), error);
                        if quota {
                            break;
                        }
                        continue;
                    }
                };

                for comment in comments {
                    if comment.id.is_empty() || !seen_comments.insert(comment.id.clone()) {
                        continue;
                    }
                    batch.candidates.push(comment_candidate(comment, &video_id, observed_at));
                }
            }

            // A query none of whose videos could be read yielded nothing.
            if answered == 0 && errored > 0 {
                batch.containers_failed += 1;
            }

            info!(
                query = query.as_str(),
                candidates = batch.candidates.len() - before,
                "Video query scanned"
            );
        }

        batch
    }
}

fn comment_candidate(
    comment: VideoComment,
    video_id: &str,
    observed_at: chrono::DateTime<Utc>,
) -> Candidate {
    let video = if comment.video_id.is_empty() {
        video_id.to_string()
    } else {
        comment.video_id
    };
    let permalink = format!("https://www.youtube.com/watch?v={video}&lc={}", comment.id);

    Candidate {
        source: Source::VideoComment,
        source_ref: comment.id,
        origin_container: video,
        text: comment.text.trim().to_string(),
        author: comment.author,
        observed_at,
        published_at: comment.published_at,
        permalink,
    }
}
