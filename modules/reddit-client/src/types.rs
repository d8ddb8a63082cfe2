use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- Wire types ---

/// Envelope for every `*.json` listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<RawThing>,
}

/// A listing child before it is narrowed by `kind`. Kinds we don't model
/// (`more`, `t5`, ...) are carried through as `Thing::Other`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawThing {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A `t3` submission.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub is_self: bool,
}

/// A `t1` comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    /// Fullname of the parent: `t3_…` for top-level comments, `t1_…` for replies.
    #[serde(default)]
    pub parent_id: String,
}

// --- Narrowed types ---

#[derive(Debug, Clone)]
pub enum Thing {
    Submission(Submission),
    Comment(Comment),
    Other(String),
}

impl TryFrom<RawThing> for Thing {
    type Error = serde_json::Error;

    fn try_from(raw: RawThing) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "t3" => Ok(Thing::Submission(serde_json::from_value(raw.data)?)),
            "t1" => Ok(Thing::Comment(serde_json::from_value(raw.data)?)),
            _ => Ok(Thing::Other(raw.kind)),
        }
    }
}

impl Submission {
    /// Fullname, falling back to `t3_{id}` when the listing omitted it.
    pub fn fullname(&self) -> String {
        if self.name.is_empty() {
            format!("t3_{}", self.id)
        } else {
            self.name.clone()
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_utc)
    }
}

impl Comment {
    pub fn fullname(&self) -> String {
        if self.name.is_empty() {
            format!("t1_{}", self.id)
        } else {
            self.name.clone()
        }
    }

    /// True when the comment replies directly to the submission.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.starts_with("t3_")
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_utc)
    }
}

fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if secs <= 0.0 {
        return None;
    }
    DateTime::from_timestamp(secs as i64, 0)
}

/// Which listing of a subreddit to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSort {
    New,
    Hot,
}

impl ListingSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingSort::New => "new",
            ListingSort::Hot => "hot",
        }
    }
}

impl std::fmt::Display for ListingSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
