// Test mocks for the scan pipeline.
//
// One mock per trait boundary:
// - MockForumFeed (ForumFeed): HashMap-based community→listing, permalink→thread
// - MockVideoApi (VideoCommentApi): HashMap-based query→videos, video→comments
// - FailingLeadSink (LeadSink): every call errors
// - RecordingNotifier (NotifyBackend): keeps what it was asked to send
//
// Plus builders for upstream items and a zero-delay ScanConfig.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use leadscan_common::{
    BudgetConfig, ForumConfig, KeywordWeight, Lead, NotifyConfig, ScanConfig, ScoringConfig,
    Source, VideoConfig,
};
use reddit_client::{Comment, ListingSort, RedditError, Submission, Thing};
use youtube_client::{VideoComment, YouTubeError};

use crate::notify::NotifyBackend;
use crate::pipeline::ScanCycleResult;
use crate::sources::{ForumFeed, VideoCommentApi};
use crate::store::{InsertOutcome, LeadSink, PersistenceError};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Profile over `r/Gold` with the budget's delays and backoff zeroed.
/// Only titles containing "where to buy" pull thread comments.
pub fn test_scan_config() -> ScanConfig {
    let mut scoring = ScoringConfig::with_keywords(vec![
        KeywordWeight::new("buy gold", 8),
        KeywordWeight::new("investing", 3),
        KeywordWeight::new("where to buy", 6),
    ]);
    scoring.min_score = 4;
    scoring.negative_keywords = vec!["gold jewelry".to_string()];
    scoring.seller_signals = vec![
        "for sale".to_string(),
        "dm me".to_string(),
        "shipping included".to_string(),
    ];

    ScanConfig {
        forum: ForumConfig {
            communities: vec!["Gold".to_string()],
            comment_triggers: Some(vec!["where to buy".to_string()]),
            ..ForumConfig::default()
        },
        video: VideoConfig {
            queries: vec!["how to buy gold".to_string()],
            ..VideoConfig::default()
        },
        scoring,
        budget: BudgetConfig {
            request_delay_ms: 0,
            backoff_base_ms: 0,
            jitter_ms: 0,
            ..BudgetConfig::default()
        },
        notify: NotifyConfig::default(),
        max_text_chars: 2000,
    }
}

// ---------------------------------------------------------------------------
// Forum
// ---------------------------------------------------------------------------

pub fn self_post(community: &str, id: &str, title: &str, selftext: &str) -> Submission {
    Submission {
        id: id.to_string(),
        name: format!("t3_{id}"),
        subreddit: community.to_string(),
        title: title.to_string(),
        selftext: selftext.to_string(),
        author: "stacker".to_string(),
        permalink: format!("/r/{community}/comments/{id}/thread/"),
        created_utc: 1_700_000_000.0,
        is_self: true,
    }
}

pub fn comment(community: &str, id: &str, parent_id: &str, body: &str) -> Comment {
    Comment {
        id: id.to_string(),
        name: format!("t1_{id}"),
        subreddit: community.to_string(),
        body: body.to_string(),
        author: "commenter".to_string(),
        permalink: format!("/r/{community}/comments/thread/x/{id}/"),
        created_utc: 1_700_000_100.0,
        parent_id: parent_id.to_string(),
    }
}

/// Unregistered listings are empty; unregistered threads 404.
pub struct MockForumFeed {
    new: HashMap<String, Vec<Submission>>,
    hot: HashMap<String, Vec<Submission>>,
    threads: HashMap<String, Vec<Comment>>,
    failing: HashSet<String>,
    /// community → remaining `new` listing calls that answer 429.
    throttled: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl MockForumFeed {
    pub fn new() -> Self {
        Self {
            new: HashMap::new(),
            hot: HashMap::new(),
            threads: HashMap::new(),
            failing: HashSet::new(),
            throttled: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_listing(mut self, community: &str, posts: Vec<Submission>) -> Self {
        self.new.insert(community.to_string(), posts);
        self
    }

    pub fn on_hot_listing(mut self, community: &str, posts: Vec<Submission>) -> Self {
        self.hot.insert(community.to_string(), posts);
        self
    }

    pub fn on_thread(mut self, permalink: &str, comments: Vec<Comment>) -> Self {
        self.threads.insert(permalink.to_string(), comments);
        self
    }

    /// Every listing of `community` answers 503.
    pub fn failing(mut self, community: &str) -> Self {
        self.failing.insert(community.to_string());
        self
    }

    /// The next `times` `new` listings of `community` answer 429.
    pub fn throttled(self, community: &str, times: u32) -> Self {
        if let Ok(mut map) = self.throttled.lock() {
            map.insert(community.to_string(), times);
        }
        self
    }

    /// Listing calls made so far, as `"{community}/{sort}"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockForumFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumFeed for MockForumFeed {
    async fn listing(
        &self,
        community: &str,
        sort: ListingSort,
        limit: u32,
    ) -> Result<Vec<Thing>, RedditError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{community}/{sort}"));
        }
        if self.failing.contains(community) {
            return Err(RedditError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        if sort == ListingSort::New {
            if let Ok(mut throttled) = self.throttled.lock() {
                if let Some(remaining) = throttled.get_mut(community) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(RedditError::RateLimited {
                            retry_after_secs: None,
                        });
                    }
                }
            }
        }

        let posts = match sort {
            ListingSort::New => self.new.get(community),
            ListingSort::Hot => self.hot.get(community),
        };
        Ok(posts
            .map(|p| {
                p.iter()
                    .take(limit as usize)
                    .cloned()
                    .map(Thing::Submission)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn thread_comments(&self, permalink: &str, limit: u32) -> Result<Vec<Comment>, RedditError> {
        match self.threads.get(permalink) {
            Some(comments) => Ok(comments.iter().take(limit as usize).cloned().collect()),
            None => Err(RedditError::Api {
                status: 404,
                message: format!("no thread at {permalink}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Video comments
// ---------------------------------------------------------------------------

pub fn video_comment(video_id: &str, id: &str, text: &str) -> VideoComment {
    VideoComment {
        id: id.to_string(),
        video_id: video_id.to_string(),
        author: "viewer".to_string(),
        text: text.to_string(),
        published_at: None,
    }
}

/// Unregistered searches find nothing; unregistered videos have no comments.
pub struct MockVideoApi {
    searches: HashMap<String, Vec<String>>,
    comments: HashMap<String, Vec<VideoComment>>,
    comments_disabled: HashSet<String>,
    failing_searches: HashSet<String>,
    failing_comments: HashSet<String>,
    quota_exhausted: bool,
}

impl MockVideoApi {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            comments: HashMap::new(),
            comments_disabled: HashSet::new(),
            failing_searches: HashSet::new(),
            failing_comments: HashSet::new(),
            quota_exhausted: false,
        }
    }

    pub fn on_search(mut self, query: &str, video_ids: Vec<&str>) -> Self {
        self.searches.insert(
            query.to_string(),
            video_ids.into_iter().map(String::from).collect(),
        );
        self
    }

    pub fn on_comments(mut self, video_id: &str, comments: Vec<VideoComment>) -> Self {
        self.comments.insert(video_id.to_string(), comments);
        self
    }

    pub fn comments_disabled(mut self, video_id: &str) -> Self {
        self.comments_disabled.insert(video_id.to_string());
        self
    }

    pub fn failing_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    /// Comment threads of `video_id` answer 500.
    pub fn failing_comments(mut self, video_id: &str) -> Self {
        self.failing_comments.insert(video_id.to_string());
        self
    }

    /// Every call answers 403 `quotaExceeded`.
    pub fn quota_exhausted(mut self) -> Self {
        self.quota_exhausted = true;
        self
    }
}

impl Default for MockVideoApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoCommentApi for MockVideoApi {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>, YouTubeError> {
        if self.quota_exhausted {
            return Err(YouTubeError::QuotaExceeded("daily quota spent".to_string()));
        }
        if self.failing_searches.contains(query) {
            return Err(YouTubeError::Api {
                status: 500,
                reason: Some("backendError".to_string()),
                message: "Backend Error".to_string(),
            });
        }
        Ok(self
            .searches
            .get(query)
            .map(|ids| ids.iter().take(max_results as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn top_level_comments(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<VideoComment>, YouTubeError> {
        if self.quota_exhausted {
            return Err(YouTubeError::QuotaExceeded("daily quota spent".to_string()));
        }
        if self.comments_disabled.contains(video_id) {
            return Err(YouTubeError::CommentsDisabled(video_id.to_string()));
        }
        if self.failing_comments.contains(video_id) {
            return Err(YouTubeError::Api {
                status: 500,
                reason: Some("backendError".to_string()),
                message: "Backend Error".to_string(),
            });
        }
        Ok(self
            .comments
            .get(video_id)
            .map(|c| c.iter().take(max_results as usize).cloned().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Storage and notification
// ---------------------------------------------------------------------------

/// Lead sink whose backing store is down.
pub struct FailingLeadSink;

#[async_trait]
impl LeadSink for FailingLeadSink {
    async fn exists(&self, _source: Source, _source_ref: &str) -> Result<bool, PersistenceError> {
        Err(PersistenceError::Storage("connection refused".to_string()))
    }

    async fn insert(&self, _lead: &Lead) -> Result<InsertOutcome, PersistenceError> {
        Err(PersistenceError::Storage("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    leads: Mutex<Vec<Lead>>,
    digests: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.leads.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn digests(&self) -> u32 {
        self.digests.lock().map(|d| *d).unwrap_or(0)
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn notify_lead(&self, lead: &Lead) -> anyhow::Result<()> {
        if let Ok(mut leads) = self.leads.lock() {
            leads.push(lead.clone());
        }
        Ok(())
    }

    async fn send_digest(&self, _result: &ScanCycleResult) -> anyhow::Result<()> {
        if let Ok(mut d) = self.digests.lock() {
            *d += 1;
        }
        Ok(())
    }
}
