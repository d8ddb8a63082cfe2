pub mod budget;
pub mod forum;
pub mod video;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use leadscan_common::{Candidate, ScanConfig, Source};

pub use budget::{RequestBudget, RetryError, RetryPolicy, Throttled};
pub use forum::{ForumAdapter, ForumFeed};
pub use video::{VideoCommentAdapter, VideoCommentApi};

/// Whether an adapter can run this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Skipped without error, e.g. a missing credential.
    Disabled { reason: String },
}

/// What an adapter will fetch this cycle, taken from the scan profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub containers: Vec<String>,
    pub per_container_limit: u32,
}

/// Per-container failure kinds.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Unreachable, non-success status, or a payload we could not parse.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("throttled on all {attempts} attempts: {last}")]
    ThrottlingRetryExhausted { attempts: u32, last: String },
}

impl<E: fmt::Display> From<RetryError<E>> for FetchError {
    fn from(err: RetryError<E>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => FetchError::ThrottlingRetryExhausted {
                attempts,
                last: last.to_string(),
            },
            RetryError::Failed(e) => FetchError::SourceUnavailable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainerError {
    pub container: String,
    /// The thread or video inside the container that failed, if narrower
    /// than the whole container.
    pub item_ref: Option<String>,
    pub error: FetchError,
}

/// Everything one adapter produced in a cycle.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub candidates: Vec<Candidate>,
    pub container_errors: Vec<ContainerError>,
    pub containers_attempted: usize,
    /// Containers that yielded nothing because their primary request failed.
    pub containers_failed: usize,
}

impl FetchBatch {
    /// Record a container whose primary request failed.
    pub fn fail_container(&mut self, container: &str, error: FetchError) {
        self.containers_failed += 1;
        self.container_errors.push(ContainerError {
            container: container.to_string(),
            item_ref: None,
            error,
        });
    }

    /// Record a secondary failure; the container's other candidates stand.
    pub fn partial_error(&mut self, container: &str, item_ref: Option<String>, error: FetchError) {
        self.container_errors.push(ContainerError {
            container: container.to_string(),
            item_ref,
            error,
        });
    }

    /// True when containers were attempted and every one of them failed.
    pub fn all_failed(&self) -> bool {
        self.containers_attempted > 0 && self.containers_failed == self.containers_attempted
    }
}

/// The standard adapter set for a scan profile, in processing order.
pub fn build_adapters(config: &ScanConfig) -> anyhow::Result<Vec<Box<dyn SourceAdapter>>> {
    let forum = ForumAdapter::from_config(config)?;
    let video = VideoCommentAdapter::from_config(config)?;
    Ok(vec![Box::new(forum), Box::new(video)])
}

/// One external content source.
///
/// Adapters never return an error from `fetch`: container failures are
/// collected into the batch and the remaining containers still run.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    fn readiness(&self) -> Readiness;

    fn plan(&self, config: &ScanConfig) -> FetchPlan;

    async fn fetch(&self, containers: &[String], per_container_limit: u32) -> FetchBatch;
}

#[cfg(test)]
mod tests {
    use reddit_client::RedditError;

    use super::*;

    #[test]
    fn exhausted_retries_map_to_throttling_kind() {
        let err: FetchError = RetryError::Exhausted {
            attempts: 4,
            last: RedditError::RateLimited {
                retry_after_secs: None,
            },
        }
        .into();
        assert!(matches!(
            err,
            FetchError::ThrottlingRetryExhausted { attempts: 4, .. }
        ));
    }

    #[test]
    fn batch_is_unavailable_only_when_every_container_failed() {
        let mut batch = FetchBatch::default();
        assert!(!batch.all_failed());

        batch.containers_attempted = 2;
        batch.fail_container("Gold", FetchError::SourceUnavailable("503".into()));
        batch.partial_error("Silverbugs", Some("t3_x".into()), FetchError::SourceUnavailable("503".into()));
        assert!(!batch.all_failed());

        batch.fail_container("Silverbugs", FetchError::SourceUnavailable("503".into()));
        assert!(batch.all_failed());
        assert_eq!(batch.container_errors.len(), 3);
    }
}
