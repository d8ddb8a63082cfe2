pub mod backend;
pub mod noop;
pub mod slack;

use std::sync::Arc;

pub use backend::NotifyBackend;
pub use noop::NoopBackend;
pub use slack::SlackWebhook;

/// Webhook backend when a URL is configured, otherwise a no-op.
pub fn backend_for(webhook_url: Option<String>) -> Arc<dyn NotifyBackend> {
    match webhook_url {
        Some(url) => Arc::new(SlackWebhook::new(url)),
        None => Arc::new(NoopBackend),
    }
}
