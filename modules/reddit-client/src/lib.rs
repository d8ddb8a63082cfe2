pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Comment, Listing, ListingSort, RawThing, Submission, Thing};

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Response, StatusCode};

const BASE_URL: &str = "https://www.reddit.com";

/// Reddit caps `limit` on listing endpoints at 100.
const MAX_LIMIT: u32 = 100;

/// Unauthenticated client for Reddit's public `.json` listings.
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    /// Build a client that sends `user_agent` and gives up on any request
    /// after `timeout`. Reddit rejects requests without a descriptive agent.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Read one page of a subreddit listing, newest or hottest first.
    pub async fn listing(&self, subreddit: &str, sort: ListingSort, limit: u32) -> Result<Vec<Thing>> {
        let url = format!(
            "{}/r/{}/{}.json?limit={}&raw_json=1",
            self.base_url,
            subreddit,
            sort,
            limit.min(MAX_LIMIT)
        );
        tracing::debug!(subreddit, %sort, limit, "Fetching subreddit listing");

        let resp = self.client.get(&url).send().await?;
        let body = check_status(resp).await?.text().await?;
        let listing: Listing = serde_json::from_str(&body)?;
        Ok(narrow(listing))
    }

    /// Fetch the comment tree of a submission by its permalink
    /// (`/r/{sub}/comments/{id}/{slug}/`). Returns only the first level of
    /// the tree; nested replies are not flattened.
    pub async fn thread_comments(&self, permalink: &str, limit: u32) -> Result<Vec<Comment>> {
        let path = permalink.trim_end_matches('/');
        let url = format!(
            "{}{}.json?limit={}&raw_json=1",
            self.base_url,
            path,
            limit.min(MAX_LIMIT)
        );
        tracing::debug!(permalink, limit, "Fetching thread comments");

        let resp = self.client.get(&url).send().await?;
        let body = check_status(resp).await?.text().await?;

        // A thread is `[submission listing, comment listing]`.
        let mut listings: Vec<Listing> = serde_json::from_str(&body)?;
        if listings.len() < 2 {
            return Err(RedditError::Parse(format!(
                "expected 2 listings for thread, got {}",
                listings.len()
            )));
        }
        let comments = listings.swap_remove(1);

        Ok(narrow(comments)
            .into_iter()
            .filter_map(|thing| match thing {
                Thing::Comment(c) => Some(c),
                _ => None,
            })
            .collect())
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|secs| secs.ceil() as u64);
        return Err(RedditError::RateLimited { retry_after_secs });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RedditError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

/// Narrow every child of a listing, dropping children whose payload does not
/// match their declared kind.
fn narrow(listing: Listing) -> Vec<Thing> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|raw| {
            let kind = raw.kind.clone();
            match Thing::try_from(raw) {
                Ok(thing) => Some(thing),
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Skipping malformed listing child");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrow_keeps_submissions_and_comments() {
        let listing: Listing = serde_json::from_value(json!({
            "data": {
                "after": null,
                "children": [
                    { "kind": "t3", "data": { "id": "abc", "name": "t3_abc", "title": "Where can I buy gold", "is_self": true, "created_utc": 1700000000.0 } },
                    { "kind": "t1", "data": { "id": "c1", "body": "try your LCS", "parent_id": "t3_abc" } },
                    { "kind": "more", "data": { "count": 12, "children": ["x", "y"] } }
                ]
            }
        }))
        .unwrap();

        let things = narrow(listing);
        assert_eq!(things.len(), 3);
        match &things[0] {
            Thing::Submission(s) => {
                assert_eq!(s.fullname(), "t3_abc");
                assert!(s.is_self);
                assert!(s.created_at().is_some());
            }
            other => panic!("expected submission, got {other:?}"),
        }
        match &things[1] {
            Thing::Comment(c) => {
                assert_eq!(c.fullname(), "t1_c1");
                assert!(c.is_top_level());
                assert!(c.created_at().is_none());
            }
            other => panic!("expected comment, got {other:?}"),
        }
        assert!(matches!(&things[2], Thing::Other(kind) if kind == "more"));
    }

    #[test]
    fn malformed_child_is_dropped() {
        let listing: Listing = serde_json::from_value(json!({
            "data": { "children": [ { "kind": "t3", "data": { "title": "no id" } } ] }
        }))
        .unwrap();

        assert!(narrow(listing).is_empty());
    }

    #[test]
    fn reply_is_not_top_level() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "c2", "parent_id": "t1_c1", "body": "agreed"
        }))
        .unwrap();
        assert!(!comment.is_top_level());
    }
}
