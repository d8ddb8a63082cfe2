pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use leadscan_common::{Lead, Source};

pub use memory::MemoryLeadSink;
pub use postgres::PgLeadSink;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A lead with the same `(source, source_ref)` already existed; nothing was written.
    AlreadyPresent,
}

/// The only storage contract the pipeline needs.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn exists(&self, source: Source, source_ref: &str) -> Result<bool, PersistenceError>;

    /// Idempotent on `(source, source_ref)`.
    async fn insert(&self, lead: &Lead) -> Result<InsertOutcome, PersistenceError>;
}
