use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use leadscan_common::{Candidate, Lead, ScanConfig};

use crate::dedup::Deduplicator;
use crate::filter::CandidateFilter;
use crate::notify::{NoopBackend, NotifyBackend};
use crate::scoring::KeywordScorer;
use crate::sources::{FetchBatch, Readiness, SourceAdapter};
use crate::store::{InsertOutcome, LeadSink};

use super::stats::{CycleError, ErrorKind, ScanCycleResult, SourceStats, SourceStatus};

/// Per-cycle scoring state shared by every source's batch.
struct CycleContext<'a> {
    config: &'a ScanConfig,
    scorer: KeywordScorer,
    filter: CandidateFilter,
    dedup: Deduplicator<'a>,
    errors: Vec<CycleError>,
}

/// Drives one scan cycle over a fixed set of adapters.
///
/// Adapters fetch concurrently; filtering, scoring, dedup and persistence
/// then run sequentially over the batches in adapter order.
pub struct ScanOrchestrator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    sink: Arc<dyn LeadSink>,
    notifier: Arc<dyn NotifyBackend>,
}

impl ScanOrchestrator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, sink: Arc<dyn LeadSink>) -> Self {
        Self {
            adapters,
            sink,
            notifier: Arc::new(NoopBackend),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotifyBackend>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run one cycle. Never fails: every error ends up in the result.
    pub async fn run_scan_cycle(&self, config: &ScanConfig) -> ScanCycleResult {
        let started_at = Utc::now();
        info!(sources = self.adapters.len(), "Scan cycle starting");

        let fetches = self.adapters.iter().map(|adapter| async move {
            match adapter.readiness() {
                Readiness::Disabled { reason } => {
                    info!(source = %adapter.source(), reason = reason.as_str(), "Source disabled, skipping");
                    None
                }
                Readiness::Ready => {
                    let plan = adapter.plan(config);
                    Some(adapter.fetch(&plan.containers, plan.per_container_limit).await)
                }
            }
        });
        let batches = join_all(fetches).await;

        let mut ctx = CycleContext {
            config,
            scorer: KeywordScorer::new(&config.scoring.keywords),
            filter: CandidateFilter::from_config(&config.scoring),
            dedup: Deduplicator::new(self.sink.as_ref()),
            errors: Vec::new(),
        };
        let mut sources = Vec::with_capacity(self.adapters.len());

        for (adapter, batch) in self.adapters.iter().zip(batches) {
            let mut stats = SourceStats::new(adapter.source());
            match batch {
                Some(batch) => self.process_batch(&mut ctx, batch, &mut stats).await,
                None => stats.status = SourceStatus::Disabled,
            }
            info!(
                source = %stats.source,
                status = ?stats.status,
                fetched = stats.fetched,
                persisted = stats.persisted,
                errors = stats.errors,
                "Source processed"
            );
            sources.push(stats);
        }

        let result = ScanCycleResult {
            started_at,
            finished_at: Utc::now(),
            sources,
            errors: ctx.errors,
        };

        if let Err(e) = self.notifier.send_digest(&result).await {
            warn!(error = %e, "Failed to send cycle digest");
        }

        result
    }

    async fn process_batch(&self, ctx: &mut CycleContext<'_>, batch: FetchBatch, stats: &mut SourceStats) {
        let source = stats.source;
        let all_failed = batch.all_failed();
        stats.fetched = batch.candidates.len() as u32;

        for err in &batch.container_errors {
            ctx.errors.push(CycleError::from_container(source, err));
            stats.errors += 1;
        }

        for candidate in batch.candidates {
            if let Some(reason) = ctx.filter.check(&candidate) {
                debug!(source_ref = candidate.source_ref.as_str(), %reason, "Candidate excluded");
                stats.excluded += 1;
                continue;
            }

            let scored = ctx.scorer.score_candidate(candidate);
            stats.scored += 1;
            if scored.score < ctx.config.scoring.min_score {
                stats.below_threshold += 1;
                continue;
            }
            stats.above_threshold += 1;

            match ctx.dedup.is_new(&scored.candidate).await {
                Ok(true) => {}
                Ok(false) => {
                    stats.duplicates += 1;
                    continue;
                }
                Err(e) => {
                    warn!(source_ref = scored.candidate.source_ref.as_str(), error = %e, "Dedup check failed");
                    ctx.errors.push(persistence_error(&scored.candidate, e.to_string()));
                    stats.errors += 1;
                    continue;
                }
            }

            let keywords = scored.keyword_list();
            let lead = Lead::from_scored(scored, ctx.config.max_text_chars);

            match self.sink.insert(&lead).await {
                Ok(InsertOutcome::Inserted) => {
                    ctx.dedup.claim(lead.source, &lead.source_ref);
                    stats.persisted += 1;
                    info!(
                        source = %lead.source,
                        source_ref = lead.source_ref.as_str(),
                        score = lead.score,
                        keywords = keywords.as_str(),
                        "Lead persisted"
                    );
                    if lead.score >= ctx.config.notify.min_score {
                        if let Err(e) = self.notifier.notify_lead(&lead).await {
                            warn!(source_ref = lead.source_ref.as_str(), error = %e, "Failed to send lead alert");
                        }
                    }
                }
                Ok(InsertOutcome::AlreadyPresent) => {
                    ctx.dedup.claim(lead.source, &lead.source_ref);
                    stats.duplicates += 1;
                }
                Err(e) => {
                    warn!(source_ref = lead.source_ref.as_str(), error = %e, "Lead insert failed");
                    ctx.errors.push(CycleError {
                        source: lead.source,
                        container: Some(lead.origin_container.clone()),
                        candidate_ref: Some(lead.source_ref.clone()),
                        kind: ErrorKind::Persistence,
                        message: e.to_string(),
                    });
                    stats.errors += 1;
                }
            }
        }

        stats.status = if all_failed {
            SourceStatus::Unavailable
        } else if stats.errors > 0 {
            SourceStatus::Partial
        } else {
            SourceStatus::Completed
        };
    }
}

fn persistence_error(candidate: &Candidate, message: String) -> CycleError {
    CycleError {
        source: candidate.source,
        container: Some(candidate.origin_container.clone()),
        candidate_ref: Some(candidate.source_ref.clone()),
        kind: ErrorKind::Persistence,
        message,
    }
}
