use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use leadscan_common::{truncate_chars, Lead, Source};

use super::backend::NotifyBackend;
use crate::pipeline::ScanCycleResult;

const PREVIEW_CHARS: usize = 300;

/// Slack incoming webhook. Discord webhook URLs get Discord's payload shape.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { webhook_url, http }
    }

    fn payload(&self, text: String) -> serde_json::Value {
        if self.webhook_url.to_lowercase().contains("discord") {
            json!({ "content": text })
        } else {
            json!({
                "text": text,
                "unfurl_links": false,
            })
        }
    }

    async fn post(&self, text: String) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&self.payload(text))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Webhook returned non-success");
            anyhow::bail!("Webhook returned {status}");
        }

        Ok(())
    }
}

fn lead_text(lead: &Lead) -> String {
    let place = match lead.source {
        Source::Forum => format!("r/{}", lead.origin_container),
        Source::VideoComment => format!("video {}", lead.origin_container),
    };
    let author = if lead.author.is_empty() {
        "unknown"
    } else {
        lead.author.as_str()
    };
    let keywords = lead
        .matched_keywords
        .iter()
        .map(|m| m.keyword.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        ":fire: *High-intent lead (score {})*\n\
         *Author:* {} in {}\n\
         *Keywords:* {}\n\n\
         {}\n\n\
         {}",
        lead.score,
        author,
        place,
        keywords,
        truncate_chars(lead.text.clone(), PREVIEW_CHARS),
        lead.permalink,
    )
}

fn digest_text(result: &ScanCycleResult) -> Option<String> {
    if result.total_persisted() == 0 && result.errors.is_empty() {
        return None;
    }

    let mut lines = vec![format!(
        ":mag: *Lead scan complete*: {} new leads from {} candidates",
        result.total_persisted(),
        result.total_fetched()
    )];
    for s in &result.sources {
        lines.push(format!(
            "  - {}: {:?}, fetched={}, persisted={}, errors={}",
            s.source, s.status, s.fetched, s.persisted, s.errors
        ));
    }
    if !result.errors.is_empty() {
        lines.push(format!("*Errors recorded:* {}", result.errors.len()));
    }
    Some(lines.join("\n"))
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn notify_lead(&self, lead: &Lead) -> anyhow::Result<()> {
        self.post(lead_text(lead)).await
    }

    async fn send_digest(&self, result: &ScanCycleResult) -> anyhow::Result<()> {
        match digest_text(result) {
            Some(text) => self.post(text).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use leadscan_common::KeywordMatch;
    use uuid::Uuid;

    use super::*;
    use crate::pipeline::{SourceStats, SourceStatus};

    #[test]
    fn discord_urls_use_content_key() {
        let discord = SlackWebhook::new("https://discord.com/api/webhooks/1/x".to_string());
        assert!(discord.payload("hi".into()).get("content").is_some());

        let slack = SlackWebhook::new("https://hooks.slack.com/services/T/B/X".to_string());
        let payload = slack.payload("hi".into());
        assert_eq!(payload["text"], "hi");
        assert_eq!(payload["unfurl_links"], false);
    }

    #[test]
    fn lead_alert_names_place_and_keywords() {
        let lead = Lead {
            id: Uuid::new_v4(),
            source: Source::Forum,
            source_ref: "t3_abc123".into(),
            origin_container: "Gold".into(),
            author: "stacker".into(),
            text: "where can I buy gold bars".into(),
            permalink: "https://www.reddit.com/r/Gold/comments/abc123/".into(),
            score: 9,
            matched_keywords: vec![KeywordMatch::new("buy gold", 8)],
            published_at: None,
            observed_at: Utc::now(),
            notes: String::new(),
            contacted: false,
        };
        let text = lead_text(&lead);
        assert!(text.contains("score 9"));
        assert!(text.contains("stacker in r/Gold"));
        assert!(text.contains("buy gold"));
    }

    #[test]
    fn quiet_cycle_sends_no_digest() {
        let mut stats = SourceStats::new(Source::Forum);
        stats.status = SourceStatus::Completed;
        let result = ScanCycleResult {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            sources: vec![stats],
            errors: Vec::new(),
        };
        assert!(digest_text(&result).is_none());
    }

    #[test]
    fn digest_totals_leads_and_candidates_across_sources() {
        let mut forum = SourceStats::new(Source::Forum);
        forum.fetched = 40;
        forum.persisted = 2;
        let mut video = SourceStats::new(Source::VideoComment);
        video.fetched = 10;
        video.persisted = 1;
        let result = ScanCycleResult {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            sources: vec![forum, video],
            errors: Vec::new(),
        };

        let text = digest_text(&result).unwrap();
        assert!(text.contains("3 new leads from 50 candidates"), "{text}");
    }
}
