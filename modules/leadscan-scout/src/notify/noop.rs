use async_trait::async_trait;

use leadscan_common::Lead;

use super::backend::NotifyBackend;
use crate::pipeline::ScanCycleResult;

/// Used when no webhook is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn notify_lead(&self, _lead: &Lead) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_digest(&self, _result: &ScanCycleResult) -> anyhow::Result<()> {
        Ok(())
    }
}
