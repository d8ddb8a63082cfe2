use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Source ---

/// External content origin a candidate was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Forum,
    VideoComment,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Forum, Source::VideoComment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Forum => "forum",
            Source::VideoComment => "video_comment",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forum" => Ok(Source::Forum),
            "video_comment" => Ok(Source::VideoComment),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

// --- Candidate ---

/// A raw text unit observed on a source, before scoring.
///
/// `(source, source_ref)` is the identity of a candidate across runs.
/// Adapters never emit a candidate with an empty `source_ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: Source,
    pub source_ref: String,
    /// Parent context (subreddit, video id). Informational only.
    pub origin_container: String,
    pub text: String,
    pub author: String,
    pub observed_at: DateTime<Utc>,
    /// Creation time on the source, when the upstream reports one.
    pub published_at: Option<DateTime<Utc>>,
    pub permalink: String,
}

impl Candidate {
    /// Dedup key.
    pub fn key(&self) -> (Source, &str) {
        (self.source, self.source_ref.as_str())
    }
}

// --- Scoring output ---

/// A keyword that contributed to a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub weight: u32,
}

impl KeywordMatch {
    pub fn new(keyword: impl Into<String>, weight: u32) -> Self {
        Self {
            keyword: keyword.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: u32,
    /// In keyword configuration order.
    pub matches: Vec<KeywordMatch>,
}

impl ScoredCandidate {
    pub fn keyword_list(&self) -> String {
        self.matches
            .iter()
            .map(|m| m.keyword.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// --- Lead ---

/// Persisted record of a scored candidate that cleared the threshold and
/// had not been captured before. `notes` and `contacted` belong to the
/// review dashboard; the pipeline only ever writes their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub source: Source,
    pub source_ref: String,
    pub origin_container: String,
    pub author: String,
    pub text: String,
    pub permalink: String,
    pub score: u32,
    pub matched_keywords: Vec<KeywordMatch>,
    pub published_at: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
    pub notes: String,
    pub contacted: bool,
}

impl Lead {
    /// Build the record to persist, truncating the body to `max_text_chars`.
    pub fn from_scored(scored: ScoredCandidate, max_text_chars: usize) -> Self {
        let ScoredCandidate {
            candidate,
            score,
            matches,
        } = scored;

        Self {
            id: Uuid::new_v4(),
            source: candidate.source,
            source_ref: candidate.source_ref,
            origin_container: candidate.origin_container,
            author: candidate.author,
            text: truncate_chars(candidate.text, max_text_chars),
            permalink: candidate.permalink,
            score,
            matched_keywords: matches,
            published_at: candidate.published_at,
            observed_at: candidate.observed_at,
            notes: String::new(),
            contacted: false,
        }
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}
