use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use leadscan_common::{Lead, Source};

use super::{InsertOutcome, LeadSink, PersistenceError};

/// Postgres-backed lead store over the `leads` table.
pub struct PgLeadSink {
    pool: PgPool,
}

impl PgLeadSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;
        info!("Connected to database");
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LeadSink for PgLeadSink {
    async fn exists(&self, source: Source, source_ref: &str) -> Result<bool, PersistenceError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM leads WHERE source = $1 AND source_ref = $2)",
        )
        .bind(source.as_str())
        .bind(source_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, lead: &Lead) -> Result<InsertOutcome, PersistenceError> {
        let keywords = serde_json::to_value(&lead.matched_keywords)
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO leads
                (id, source, source_ref, origin_container, author, content, permalink,
                 score, matched_keywords, published_at, observed_at, notes, contacted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source, source_ref) DO NOTHING
            "#,
        )
        .bind(lead.id)
        .bind(lead.source.as_str())
        .bind(&lead.source_ref)
        .bind(&lead.origin_container)
        .bind(&lead.author)
        .bind(&lead.text)
        .bind(&lead.permalink)
        .bind(lead.score as i32)
        .bind(&keywords)
        .bind(lead.published_at)
        .bind(lead.observed_at)
        .bind(&lead.notes)
        .bind(lead.contacted)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyPresent)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}
