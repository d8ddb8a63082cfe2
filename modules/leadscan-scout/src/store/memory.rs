use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use leadscan_common::{Lead, Source};

use super::{InsertOutcome, LeadSink, PersistenceError};

/// In-process lead store. Backs `--dry-run` and tests.
#[derive(Default)]
pub struct MemoryLeadSink {
    leads: Mutex<HashMap<(Source, String), Lead>>,
}

impl MemoryLeadSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored leads, highest score first.
    pub fn leads(&self) -> Vec<Lead> {
        let mut leads: Vec<Lead> = match self.leads.lock() {
            Ok(map) => map.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        };
        leads.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.source_ref.cmp(&b.source_ref)));
        leads
    }

    pub fn len(&self) -> usize {
        self.leads.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LeadSink for MemoryLeadSink {
    async fn exists(&self, source: Source, source_ref: &str) -> Result<bool, PersistenceError> {
        let map = self
            .leads
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(map.contains_key(&(source, source_ref.to_string())))
    }

    async fn insert(&self, lead: &Lead) -> Result<InsertOutcome, PersistenceError> {
        let mut map = self
            .leads
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        let key = (lead.source, lead.source_ref.clone());
        if map.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        map.insert(key, lead.clone());
        Ok(InsertOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn lead(source_ref: &str, score: u32) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            source: Source::Forum,
            source_ref: source_ref.to_string(),
            origin_container: "Gold".to_string(),
            author: "stacker".to_string(),
            text: "buy gold".to_string(),
            permalink: String::new(),
            score,
            matched_keywords: Vec::new(),
            published_at: None,
            observed_at: Utc::now(),
            notes: String::new(),
            contacted: false,
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_key_is_already_present() {
        let sink = MemoryLeadSink::new();
        assert_eq!(sink.insert(&lead("t3_a", 8)).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(
            sink.insert(&lead("t3_a", 9)).await.unwrap(),
            InsertOutcome::AlreadyPresent
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.leads()[0].score, 8);
    }

    #[tokio::test]
    async fn same_ref_under_another_source_is_distinct() {
        let sink = MemoryLeadSink::new();
        sink.insert(&lead("abc", 5)).await.unwrap();
        assert!(sink.exists(Source::Forum, "abc").await.unwrap());
        assert!(!sink.exists(Source::VideoComment, "abc").await.unwrap());
    }
}
