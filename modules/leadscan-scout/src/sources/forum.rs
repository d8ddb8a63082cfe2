use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use leadscan_common::{Candidate, ScanConfig, Source};
use reddit_client::{Comment, ListingSort, RedditClient, RedditError, Submission, Thing};

use super::{FetchBatch, FetchError, FetchPlan, Readiness, RequestBudget, SourceAdapter};

const REDDIT_URL: &str = "https://www.reddit.com";

/// Read side of the forum upstream.
#[async_trait]
pub trait ForumFeed: Send + Sync {
    async fn listing(
        &self,
        community: &str,
        sort: ListingSort,
        limit: u32,
    ) -> Result<Vec<Thing>, RedditError>;

    async fn thread_comments(&self, permalink: &str, limit: u32) -> Result<Vec<Comment>, RedditError>;
}

#[async_trait]
impl ForumFeed for RedditClient {
    async fn listing(
        &self,
        community: &str,
        sort: ListingSort,
        limit: u32,
    ) -> Result<Vec<Thing>, RedditError> {
        RedditClient::listing(self, community, sort, limit).await
    }

    async fn thread_comments(&self, permalink: &str, limit: u32) -> Result<Vec<Comment>, RedditError> {
        RedditClient::thread_comments(self, permalink, limit).await
    }
}

/// Public forum feed: self posts from each community's `new` (and
/// optionally `hot`) listing, plus top-level comments on threads whose
/// title carries a comment trigger.
pub struct ForumAdapter {
    feed: Arc<dyn ForumFeed>,
    budget: RequestBudget,
    hot_limit: u32,
    include_comments: bool,
    comment_triggers: Vec<String>,
    comment_limit: u32,
}

impl ForumAdapter {
    pub fn new(feed: Arc<dyn ForumFeed>, config: &ScanConfig) -> Self {
        Self {
            feed,
            budget: RequestBudget::from_config(&config.budget),
            hot_limit: config.forum.hot_limit,
            include_comments: config.forum.include_comments,
            comment_triggers: config
                .comment_triggers()
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            comment_limit: config.forum.comment_limit,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Result<Self, RedditError> {
        let client = RedditClient::new(&config.budget.user_agent, config.budget.request_timeout())?;
        Ok(Self::new(Arc::new(client), config))
    }

    fn wants_comments(&self, title: &str) -> bool {
        if !self.include_comments {
            return false;
        }
        let title = title.to_lowercase();
        self.comment_triggers.iter().any(|t| title.contains(t.as_str()))
    }

    async fn fetch_community(
        &self,
        community: &str,
        limit: u32,
        seen: &mut HashSet<String>,
        batch: &mut FetchBatch,
    ) {
        let mut things = match self
            .budget
            .call("forum.new", || self.feed.listing(community, ListingSort::New, limit))
            .await
        {
            Ok(things) => things,
            Err(e) => {
                warn!(community, error = %e, "Forum listing failed");
                batch.fail_container(community, e.into());
                return;
            }
        };

        if self.hot_limit > 0 {
            match self
                .budget
                .call("forum.hot", || {
                    self.feed.listing(community, ListingSort::Hot, self.hot_limit)
                })
                .await
            {
                Ok(mut hot) => things.append(&mut hot),
                Err(e) => {
                    warn!(community, error = %e, "Forum hot listing failed");
                    batch.partial_error(community, None, e.into());
                }
            }
        }

        let observed_at = Utc::now();
        let before = batch.candidates.len();

        for thing in things {
            let Thing::Submission(post) = thing else {
                continue;
            };
            if !post.is_self || post.id.trim().is_empty() {
                continue;
            }
            let fullname = post.fullname();
            if !seen.insert(fullname.clone()) {
                continue;
            }

            let thread = self.wants_comments(&post.title).then(|| post.permalink.clone());
            batch
                .candidates
                .push(submission_candidate(community, post, observed_at));

            let Some(permalink) = thread.filter(|p| !p.is_empty()) else {
                continue;
            };
            let comments = self
                .budget
                .call("forum.thread", || {
                    self.feed.thread_comments(&permalink, self.comment_limit)
                })
                .await;
            match comments {
                Ok(comments) => {
                    for comment in comments {
                        if !comment.is_top_level() || comment.id.trim().is_empty() {
                            continue;
                        }
                        if !seen.insert(comment.fullname()) {
                            continue;
                        }
                        batch
                            .candidates
                            .push(comment_candidate(community, comment, observed_at));
                    }
                }
                Err(e) => {
                    warn!(community, thread = %fullname, error = %e, "Thread comments failed");
                    batch.partial_error(community, Some(fullname), FetchError::from(e));
                }
            }
        }

        info!(
            community,
            candidates = batch.candidates.len() - before,
            "Forum community scanned"
        );
    }
}

#[async_trait]
impl SourceAdapter for ForumAdapter {
    fn source(&self) -> Source {
        Source::Forum
    }

    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    fn plan(&self, config: &ScanConfig) -> FetchPlan {
        FetchPlan {
            containers: config.forum.communities.clone(),
            per_container_limit: config.forum.per_community_limit,
        }
    }

    async fn fetch(&self, containers: &[String], per_container_limit: u32) -> FetchBatch {
        let mut batch = FetchBatch::default();
        let mut seen = HashSet::new();

        for community in containers {
            batch.containers_attempted += 1;
            self.fetch_community(community, per_container_limit, &mut seen, &mut batch)
                .await;
        }

        batch
    }
}

fn submission_candidate(community: &str, post: Submission, observed_at: DateTime<Utc>) -> Candidate {
    let published_at = post.created_at();
    let source_ref = post.fullname();
    let permalink = format!("{REDDIT_URL}/r/{community}/comments/{}/", post.id);
    let origin_container = if post.subreddit.is_empty() {
        community.to_string()
    } else {
        post.subreddit
    };

    Candidate {
        source: Source::Forum,
        source_ref,
        origin_container,
        text: format!("{} {}", post.title, post.selftext).trim().to_string(),
        author: post.author,
        observed_at,
        published_at,
        permalink,
    }
}

fn comment_candidate(community: &str, comment: Comment, observed_at: DateTime<Utc>) -> Candidate {
    let published_at = comment.created_at();
    let source_ref = comment.fullname();
    let permalink = if comment.permalink.starts_with("http") {
        comment.permalink
    } else {
        format!("{REDDIT_URL}{}", comment.permalink)
    };
    let origin_container = if comment.subreddit.is_empty() {
        community.to_string()
    } else {
        comment.subreddit
    };

    Candidate {
        source: Source::Forum,
        source_ref,
        origin_container,
        text: comment.body.trim().to_string(),
        author: comment.author,
        observed_at,
        published_at,
        permalink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{comment, self_post, test_scan_config, MockForumFeed};

    fn adapter(feed: MockForumFeed) -> ForumAdapter {
        ForumAdapter::new(Arc::new(feed), &test_scan_config())
    }

    fn communities(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn self_posts_become_candidates_with_fullname_refs() {
        let mut link_post = self_post("Gold", "l1", "buy gold link", "");
        link_post.is_self = false;

        let feed = MockForumFeed::new().on_listing(
            "Gold",
            vec![
                self_post("Gold", "abc123", "Gold bars for a first stack?", "first time buyer"),
                link_post,
            ],
        );

        let batch = adapter(feed).fetch(&communities(&["Gold"]), 50).await;
        assert_eq!(batch.candidates.len(), 1);
        let c = &batch.candidates[0];
        assert_eq!(c.source_ref, "t3_abc123");
        assert_eq!(c.text, "Gold bars for a first stack? first time buyer");
        assert_eq!(c.permalink, "https://www.reddit.com/r/Gold/comments/abc123/");
        assert!(batch.container_errors.is_empty());
    }

    #[tokio::test]
    async fn trigger_in_title_pulls_top_level_comments() {
        let post = self_post("Gold", "abc123", "Where to buy gold near me", "");
        let permalink = post.permalink.clone();
        let mut reply = comment("Gold", "c2", "t1_c1", "same question");
        reply.permalink = "/r/Gold/comments/abc123/x/c2/".to_string();

        let feed = MockForumFeed::new()
            .on_listing("Gold", vec![post])
            .on_thread(
                &permalink,
                vec![comment("Gold", "c1", "t3_abc123", "I also want to buy gold"), reply],
            );

        let batch = adapter(feed).fetch(&communities(&["Gold"]), 50).await;
        let refs: Vec<_> = batch.candidates.iter().map(|c| c.source_ref.as_str()).collect();
        assert_eq!(refs, vec!["t3_abc123", "t1_c1"]);
        assert!(batch.candidates[1].permalink.starts_with("https://www.reddit.com/r/Gold/"));
    }

    #[tokio::test]
    async fn failing_community_does_not_stop_the_others() {
        let feed = MockForumFeed::new()
            .failing("Gold")
            .on_listing("Silverbugs", vec![self_post("Silverbugs", "s1", "first silver buy", "")]);

        let batch = adapter(feed)
            .fetch(&communities(&["Gold", "Silverbugs"]), 50)
            .await;
        assert_eq!(batch.containers_attempted, 2);
        assert_eq!(batch.containers_failed, 1);
        assert_eq!(batch.container_errors[0].container, "Gold");
        assert_eq!(batch.candidates.len(), 1);
        assert!(!batch.all_failed());
    }

    #[tokio::test]
    async fn thread_failure_keeps_the_submission() {
        let post = self_post("Gold", "abc123", "where to buy gold", "");
        let feed = MockForumFeed::new().on_listing("Gold", vec![post]);

        let batch = adapter(feed).fetch(&communities(&["Gold"]), 50).await;
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.containers_failed, 0);
        assert_eq!(batch.container_errors.len(), 1);
        assert_eq!(batch.container_errors[0].item_ref.as_deref(), Some("t3_abc123"));
    }

    #[tokio::test]
    async fn duplicate_across_listings_is_emitted_once() {
        let post = self_post("Gold", "abc123", "stacking question", "");
        let feed = Arc::new(
            MockForumFeed::new()
                .on_listing("Gold", vec![post.clone()])
                .on_hot_listing("Gold", vec![post]),
        );

        let adapter = ForumAdapter::new(feed.clone(), &test_scan_config());
        let batch = adapter.fetch(&communities(&["Gold"]), 50).await;
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(feed.calls(), vec!["Gold/new", "Gold/hot"]);
    }
}
