//! Reading persistence
//!
//! Readings are appended to the source-of-record table that analytics-sync
//! aggregates. The table is created once, on first use, when missing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrica_core::{MetricName, Reading};
use metrica_store::{Result, StorePool};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Append-only sink for validated readings
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, username: &str, metric: &MetricName, value: f64) -> Result<Reading>;

    async fn is_healthy(&self) -> bool;
}

pub struct PgReadingStore {
    pool: StorePool,
    table: String,
    schema: OnceCell<()>,
}

impl PgReadingStore {
    /// `table` must already be a validated identifier.
    pub fn new(pool: StorePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            schema: OnceCell::new(),
        }
    }

    // One statement batch runs as one transaction, so the advisory lock
    // serializes creation across replicas too.
    fn create_sql(&self) -> String {
        format!(
            "SELECT pg_advisory_xact_lock(hashtext('{table}')); \
             CREATE TABLE IF NOT EXISTS {table} (\
                id BIGSERIAL PRIMARY KEY, \
                username TEXT NOT NULL, \
                metric TEXT NOT NULL, \
                value DOUBLE PRECISION NOT NULL, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            table = self.table
        )
    }

    /// Create the readings table if needed. Concurrent callers wait for the
    /// first; a failed attempt is retried by the next caller.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                let conn = self.pool.get().await?;
                conn.batch_execute(&self.create_sql()).await?;
                info!(table = %self.table, "Readings table ready");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (username, metric, value) VALUES ($1, $2, $3) RETURNING created_at",
            self.table
        )
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, username: &str, metric: &MetricName, value: f64) -> Result<Reading> {
        self.ensure_schema().await?;
        let conn = self.pool.get().await?;

        let row = conn
            .query_one(&self.insert_sql(), &[&username, &metric.as_str(), &value])
            .await?;
        let created_at: DateTime<Utc> = row.try_get(0)?;

        debug!(username, metric = %metric, value, "Reading stored");
        Ok(Reading {
            username: username.to_string(),
            metric: metric.clone(),
            value,
            created_at,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}
