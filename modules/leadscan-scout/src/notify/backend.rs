use async_trait::async_trait;

use leadscan_common::Lead;

use crate::pipeline::ScanCycleResult;

/// Pluggable alert channel for high-intent leads.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Alert on a single newly persisted lead.
    async fn notify_lead(&self, lead: &Lead) -> anyhow::Result<()>;

    /// Summarize a finished cycle.
    async fn send_digest(&self, result: &ScanCycleResult) -> anyhow::Result<()>;
}
