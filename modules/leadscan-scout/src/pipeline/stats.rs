use chrono::{DateTime, Utc};
use serde::Serialize;

use leadscan_common::Source;

use crate::sources::{ContainerError, FetchError};

/// How far a source got in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Completed,
    /// Some containers or candidates failed; the rest were processed.
    Partial,
    /// Every container failed.
    Unavailable,
    /// Skipped by readiness, e.g. no credential.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SourceUnavailable,
    ThrottlingRetryExhausted,
    Persistence,
}

/// A failure captured as data. Nothing crosses the cycle boundary as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleError {
    pub source: Source,
    pub container: Option<String>,
    pub candidate_ref: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl CycleError {
    pub fn from_container(source: Source, err: &ContainerError) -> Self {
        let kind = match err.error {
            FetchError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            FetchError::ThrottlingRetryExhausted { .. } => ErrorKind::ThrottlingRetryExhausted,
        };
        Self {
            source,
            container: Some(err.container.clone()),
            candidate_ref: err.item_ref.clone(),
            kind,
            message: err.error.to_string(),
        }
    }
}

/// Per-source counters for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub source: Source,
    pub status: SourceStatus,
    pub fetched: u32,
    pub excluded: u32,
    pub scored: u32,
    pub below_threshold: u32,
    pub above_threshold: u32,
    pub duplicates: u32,
    pub persisted: u32,
    pub errors: u32,
}

impl SourceStats {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            status: SourceStatus::Completed,
            fetched: 0,
            excluded: 0,
            scored: 0,
            below_threshold: 0,
            above_threshold: 0,
            duplicates: 0,
            persisted: 0,
            errors: 0,
        }
    }
}

/// Summary of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanCycleResult {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In adapter order.
    pub sources: Vec<SourceStats>,
    pub errors: Vec<CycleError>,
}

impl ScanCycleResult {
    pub fn source(&self, source: Source) -> Option<&SourceStats> {
        self.sources.iter().find(|s| s.source == source)
    }

    pub fn total_persisted(&self) -> u32 {
        self.sources.iter().map(|s| s.persisted).sum()
    }

    pub fn total_fetched(&self) -> u32 {
        self.sources.iter().map(|s| s.fetched).sum()
    }
}

impl std::fmt::Display for ScanCycleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scan Cycle Complete ===")?;
        writeln!(
            f,
            "Duration:           {}s",
            (self.finished_at - self.started_at).num_seconds()
        )?;
        for s in &self.sources {
            writeln!(f, "\n[{}] {:?}", s.source, s.status)?;
            writeln!(f, "  Fetched:          {}", s.fetched)?;
            writeln!(f, "  Excluded:         {}", s.excluded)?;
            writeln!(f, "  Scored:           {}", s.scored)?;
            writeln!(f, "  Below threshold:  {}", s.below_threshold)?;
            writeln!(f, "  Above threshold:  {}", s.above_threshold)?;
            writeln!(f, "  Duplicates:       {}", s.duplicates)?;
            writeln!(f, "  Persisted:        {}", s.persisted)?;
            writeln!(f, "  Errors:           {}", s.errors)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for e in &self.errors {
                let at = e
                    .candidate_ref
                    .as_deref()
                    .or(e.container.as_deref())
                    .unwrap_or("-");
                writeln!(f, "  {} {} {:?}: {}", e.source, at, e.kind, e.message)?;
            }
        }
        Ok(())
    }
}
