use std::collections::HashSet;

use leadscan_common::{Candidate, Source};

use crate::store::{LeadSink, PersistenceError};

/// Cycle-scoped duplicate check: persisted leads plus keys already claimed
/// earlier in the same cycle.
pub struct Deduplicator<'a> {
    sink: &'a dyn LeadSink,
    claimed: HashSet<(Source, String)>,
}

impl<'a> Deduplicator<'a> {
    pub fn new(sink: &'a dyn LeadSink) -> Self {
        Self {
            sink,
            claimed: HashSet::new(),
        }
    }

    pub async fn is_new(&self, candidate: &Candidate) -> Result<bool, PersistenceError> {
        let (source, source_ref) = candidate.key();
        if self.claimed.contains(&(source, source_ref.to_string())) {
            return Ok(false);
        }
        let exists = self.sink.exists(source, source_ref).await?;
        Ok(!exists)
    }

    /// Mark a key as taken for the rest of the cycle.
    pub fn claim(&mut self, source: Source, source_ref: &str) {
        self.claimed.insert((source, source_ref.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryLeadSink;

    fn candidate(source_ref: &str) -> Candidate {
        Candidate {
            source: Source::Forum,
            source_ref: source_ref.to_string(),
            origin_container: "Gold".to_string(),
            text: "buy gold".to_string(),
            author: "a".to_string(),
            observed_at: Utc::now(),
            published_at: None,
            permalink: String::new(),
        }
    }

    #[tokio::test]
    async fn claimed_key_is_no_longer_new() {
        let sink = MemoryLeadSink::new();
        let mut dedup = Deduplicator::new(&sink);
        let c = candidate("t3_abc123");

        assert!(dedup.is_new(&c).await.unwrap());
        dedup.claim(c.source, &c.source_ref);
        assert!(!dedup.is_new(&c).await.unwrap());
        assert!(dedup.is_new(&candidate("t3_other")).await.unwrap());
    }
}
