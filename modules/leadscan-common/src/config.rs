use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "config/leadscan.toml";
const DEFAULT_SCAN_INTERVAL_HOURS: u64 = 2;

// ---------------------------------------------------------------------------
// AppConfig: secrets and env-specific values
// ---------------------------------------------------------------------------

/// Application configuration loaded from environment variables.
/// Holds only secrets and deployment values; communities, keywords and
/// limits live in the TOML scan profile.
#[derive(Clone)]
pub struct AppConfig {
    /// Required by the binary unless it runs with `--dry-run`.
    pub database_url: Option<String>,
    pub youtube_api_key: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub config_path: PathBuf,
    pub scan_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let scan_interval = parse_scan_interval(env::var("SCAN_INTERVAL_HOURS").ok())?;

        let config = Self {
            database_url: optional_env("DATABASE_URL"),
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            slack_webhook_url: optional_env("SLACK_WEBHOOK_URL"),
            config_path: env::var("LEADSCAN_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
            scan_interval,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview_opt(&self.database_url));
        tracing::info!("  YOUTUBE_API_KEY: {}", preview_opt(&self.youtube_api_key));
        tracing::info!("  SLACK_WEBHOOK_URL: {}", preview_opt(&self.slack_webhook_url));
        tracing::info!("  LEADSCAN_CONFIG: {}", self.config_path.display());
        tracing::info!("  SCAN_INTERVAL: {}h", self.scan_interval.as_secs() / 3600);
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &preview_opt(&self.database_url))
            .field("youtube_api_key", &preview_opt(&self.youtube_api_key))
            .field("slack_webhook_url", &preview_opt(&self.slack_webhook_url))
            .field("config_path", &self.config_path)
            .field("scan_interval", &self.scan_interval)
            .finish()
    }
}

/// Whole hours, at least one. Unset means the default.
fn parse_scan_interval(raw: Option<String>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_SCAN_INTERVAL_HOURS * 3600));
    };
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|hours| *hours > 0)
        .and_then(|hours| hours.checked_mul(3600))
        .map(Duration::from_secs)
        .ok_or(ConfigError::InvalidEnv {
            key: "SCAN_INTERVAL_HOURS",
            value: raw,
        })
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn preview(val: &str) -> String {
    let n = val
        .char_indices()
        .nth(5)
        .map(|(i, _)| i)
        .unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.len())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// ScanConfig: the TOML scan profile
// ---------------------------------------------------------------------------

/// Everything one scan cycle needs. Immutable once loaded; a cycle's
/// behavior is fully determined by this value plus upstream content.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub video: VideoConfig,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Lead bodies are truncated to this many characters before persisting.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForumConfig {
    #[serde(default)]
    pub communities: Vec<String>,
    #[serde(default = "default_per_community_limit")]
    pub per_community_limit: u32,
    /// Also read the `hot` listing. 0 disables it.
    #[serde(default = "default_hot_limit")]
    pub hot_limit: u32,
    #[serde(default = "default_true")]
    pub include_comments: bool,
    /// Title phrases that cause a thread's comments to be fetched.
    /// Falls back to the scoring keyword phrases when unset.
    #[serde(default)]
    pub comment_triggers: Option<Vec<String>>,
    #[serde(default = "default_comment_limit")]
    pub comment_limit: u32,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoConfig {
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default = "default_videos_per_query")]
    pub videos_per_query: u32,
    #[serde(default = "default_comments_per_video")]
    pub comments_per_video: u32,
    /// Never read from the file; injected from `YOUTUBE_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Inclusive: a candidate scoring exactly this much is kept.
    #[serde(default = "default_min_score")]
    pub min_score: u32,
    /// Ordered; match lists follow this order.
    pub keywords: Vec<KeywordWeight>,
    #[serde(default)]
    pub negative_keywords: Vec<String>,
    #[serde(default)]
    pub seller_signals: Vec<String>,
    #[serde(default = "default_seller_signal_min_hits")]
    pub seller_signal_min_hits: usize,
    #[serde(default = "default_ignored_authors")]
    pub ignored_authors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordWeight {
    pub phrase: String,
    pub weight: u32,
}

impl KeywordWeight {
    pub fn new(phrase: impl Into<String>, weight: u32) -> Self {
        Self {
            phrase: phrase.into(),
            weight,
        }
    }
}

/// Upstream request budget, shared in shape (not in state) by every adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Persisted leads at or above this score trigger an alert.
    #[serde(default = "default_notify_min_score")]
    pub min_score: u32,
}

impl ScanConfig {
    /// Read, parse and validate a scan profile from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScanConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validated()
    }

    /// Attach the video API credential. `None` leaves the video source disabled.
    pub fn with_video_api_key(mut self, api_key: Option<String>) -> Self {
        self.video.api_key = api_key;
        self
    }

    /// Normalize community names and reject profiles the scorer cannot honor.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.scoring.keywords.is_empty() {
            return Err(ConfigError::Invalid("scoring.keywords must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for kw in &mut self.scoring.keywords {
            kw.phrase = kw.phrase.trim().to_string();
            if kw.phrase.is_empty() {
                return Err(ConfigError::Invalid("keyword phrase must not be blank".into()));
            }
            if !(1..=10).contains(&kw.weight) {
                return Err(ConfigError::Invalid(format!(
                    "keyword '{}' has weight {}, expected 1-10",
                    kw.phrase, kw.weight
                )));
            }
            if !seen.insert(kw.phrase.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "keyword '{}' is listed more than once",
                    kw.phrase
                )));
            }
        }

        if self.budget.max_attempts == 0 {
            return Err(ConfigError::Invalid("budget.max_attempts must be at least 1".into()));
        }
        if self.scoring.seller_signal_min_hits == 0 {
            return Err(ConfigError::Invalid(
                "scoring.seller_signal_min_hits must be at least 1".into(),
            ));
        }

        self.forum.communities = self
            .forum
            .communities
            .iter()
            .map(|c| c.trim().trim_start_matches("/").trim_start_matches("r/").to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self.video.queries = self
            .video
            .queries
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        Ok(self)
    }

    /// Title phrases that trigger a comment fetch on the forum.
    pub fn comment_triggers(&self) -> Vec<String> {
        match &self.forum.comment_triggers {
            Some(triggers) => triggers.clone(),
            None => self
                .scoring
                .keywords
                .iter()
                .map(|kw| kw.phrase.clone())
                .collect(),
        }
    }
}

impl BudgetConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for VideoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoConfig")
            .field("queries", &self.queries)
            .field("videos_per_query", &self.videos_per_query)
            .field("comments_per_video", &self.comments_per_video)
            .field("api_key", &preview_opt(&self.api_key))
            .finish()
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            communities: Vec::new(),
            per_community_limit: default_per_community_limit(),
            hot_limit: default_hot_limit(),
            include_comments: true,
            comment_triggers: None,
            comment_limit: default_comment_limit(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            videos_per_query: default_videos_per_query(),
            comments_per_video: default_comments_per_video(),
            api_key: None,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            jitter_ms: default_jitter_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            min_score: default_notify_min_score(),
        }
    }
}

impl ScoringConfig {
    /// Scoring section with the given keywords and defaults everywhere else.
    pub fn with_keywords(keywords: Vec<KeywordWeight>) -> Self {
        Self {
            min_score: default_min_score(),
            keywords,
            negative_keywords: Vec::new(),
            seller_signals: Vec::new(),
            seller_signal_min_hits: default_seller_signal_min_hits(),
            ignored_authors: default_ignored_authors(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_text_chars() -> usize {
    2000
}
fn default_per_community_limit() -> u32 {
    50
}
fn default_hot_limit() -> u32 {
    25
}
fn default_comment_limit() -> u32 {
    100
}
fn default_videos_per_query() -> u32 {
    5
}
fn default_comments_per_video() -> u32 {
    100
}
fn default_min_score() -> u32 {
    4
}
fn default_seller_signal_min_hits() -> usize {
    2
}
fn default_ignored_authors() -> Vec<String> {
    vec!["[deleted]".to_string(), "AutoModerator".to_string()]
}
fn default_request_delay_ms() -> u64 {
    2000
}
fn default_max_attempts() -> u32 {
    4
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    "leadscan/0.1 (lead research)".to_string()
}
fn default_notify_min_score() -> u32 {
    8
}
