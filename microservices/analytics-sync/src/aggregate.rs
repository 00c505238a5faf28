//! Aggregate Reader
//!
//! Computes one summary row per distinct metric from the source of record.
//! Read-only: the readings table is never written from here.

use async_trait::async_trait;
use metrica_core::MetricSummary;
use metrica_store::{Row, StoreClient, StoreConfig};
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};

/// Anything that can produce the per-metric summaries for a cycle
#[async_trait]
pub trait AggregateSource: Send + Sync {
    /// Ordering of the returned summaries is unspecified.
    async fn fetch_summaries(&self) -> Result<Vec<MetricSummary>>;
}

/// Aggregate Reader over the relational source of record
pub struct PgAggregateReader {
    config: StoreConfig,
    query: String,
}

impl PgAggregateReader {
    /// `table` must already be a validated identifier.
    pub fn new(config: StoreConfig, table: &str) -> Self {
        Self {
            config,
            query: summary_query(table),
        }
    }
}

fn summary_query(table: &str) -> String {
    format!(
        "SELECT metric, \
                MIN(value)::DOUBLE PRECISION AS min_v, \
                MAX(value)::DOUBLE PRECISION AS max_v, \
                AVG(value)::DOUBLE PRECISION AS avg_v, \
                COUNT(*)::BIGINT AS cnt \
         FROM {} \
         GROUP BY metric",
        table
    )
}

fn malformed(err: impl std::fmt::Display) -> SyncError {
    SyncError::SourceUnavailable(format!("malformed summary row: {}", err))
}

fn summary_from_row(row: &Row) -> Result<MetricSummary> {
    let count: i64 = row.try_get("cnt").map_err(malformed)?;
    let count = u64::try_from(count)
        .map_err(|_| SyncError::SourceUnavailable(format!("negative count {}", count)))?;

    Ok(MetricSummary {
        metric: row.try_get("metric").map_err(malformed)?,
        min: row.try_get("min_v").map_err(malformed)?,
        max: row.try_get("max_v").map_err(malformed)?,
        avg: row.try_get("avg_v").map_err(malformed)?,
        count,
    })
}

#[async_trait]
impl AggregateSource for PgAggregateReader {
    #[instrument(skip(self))]
    async fn fetch_summaries(&self) -> Result<Vec<MetricSummary>> {
        // Connection scoped to this call; dropped on every return path below.
        let client = StoreClient::connect(&self.config)
            .await
            .map_err(|e| SyncError::SourceUnavailable(e.to_string()))?;

        let rows = client
            .query(&self.query, &[])
            .await
            .map_err(|e| SyncError::SourceUnavailable(e.to_string()))?;

        let summaries = rows.iter().map(summary_from_row).collect::<Result<Vec<_>>>()?;
        debug!(metrics = summaries.len(), "Fetched metric summaries");
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_store::Endpoint;

    #[test]
    fn test_query_groups_by_metric() {
        let sql = summary_query("readings");
        assert!(sql.contains("FROM readings"));
        assert!(sql.contains("GROUP BY metric"));
        assert!(sql.contains("AVG(value)::DOUBLE PRECISION"));
        assert!(sql.contains("COUNT(*)::BIGINT"));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_source_unavailable() {
        let config = StoreConfig::new(Endpoint::Url("postgres://metrica@127.0.0.1:1/metrica".into()));
        let reader = PgAggregateReader::new(config, "readings");
        let err = reader.fetch_summaries().await.unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_summaries_against_live_store() {
        let Ok(url) = std::env::var("METRICA_TEST_DB_URL") else {
            return;
        };
        let config = StoreConfig::new(Endpoint::Url(url));
        let client = StoreClient::connect(&config).await.unwrap();
        client
            .batch_execute(
                "DROP TABLE IF EXISTS metrica_test_agg_readings; \
                 CREATE TABLE metrica_test_agg_readings (username TEXT, metric TEXT, value DOUBLE PRECISION); \
                 INSERT INTO metrica_test_agg_readings VALUES ('a','temp',10),('b','temp',20),('c','grade',90);",
            )
            .await
            .unwrap();

        let reader = PgAggregateReader::new(config, "metrica_test_agg_readings");
        let mut summaries = reader.fetch_summaries().await.unwrap();
        client
            .batch_execute("DROP TABLE metrica_test_agg_readings")
            .await
            .unwrap();
        summaries.sort_by(|a, b| a.metric.cmp(&b.metric));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].metric, "grade");
        assert_eq!(summaries[0].count, 1);
        assert_eq!(summaries[1].metric, "temp");
        assert_eq!(summaries[1].min, Some(10.0));
        assert_eq!(summaries[1].max, Some(20.0));
        assert_eq!(summaries[1].avg, Some(15.0));
        assert_eq!(summaries[1].count, 2);
    }

    #[tokio::test]
    async fn test_timed_out_cycles_release_server_backends() {
        use crate::policy::SchedulePolicy;
        use crate::scheduler::{CycleOutcome, SyncScheduler};
        use crate::testing::MemorySink;
        use std::time::Duration;

        let Ok(url) = std::env::var("METRICA_TEST_DB_URL") else {
            return;
        };
        let timeout = Duration::from_secs(1);
        let config = StoreConfig::new(Endpoint::Url(url)).with_statement_timeout(timeout);
        let admin = StoreClient::connect(&config).await.unwrap();
        admin
            .batch_execute(
                "DROP VIEW IF EXISTS metrica_test_slow_readings; \
                 CREATE VIEW metrica_test_slow_readings AS \
                 SELECT 'a'::TEXT AS username, 'temp'::TEXT AS metric, 1.0::DOUBLE PRECISION AS value \
                 FROM pg_sleep(20);",
            )
            .await
            .unwrap();

        let reader = PgAggregateReader::new(config, "metrica_test_slow_readings");
        let policy = SchedulePolicy {
            source_timeout: timeout,
            ..SchedulePolicy::default()
        };
        let mut scheduler = SyncScheduler::new(reader, MemorySink::default(), policy);
        for _ in 0..3 {
            let outcome = scheduler.run_cycle().await;
            assert!(matches!(
                outcome,
                CycleOutcome::Failed(SyncError::SourceUnavailable(_))
            ));
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let rows = admin
            .query(
                "SELECT COUNT(*) FROM pg_stat_activity \
                 WHERE query LIKE '%metrica_test_slow_readings%' \
                 AND state = 'active' AND pid <> pg_backend_pid()",
                &[],
            )
            .await
            .unwrap();
        let lingering: i64 = rows[0].get(0);

        admin
            .batch_execute("DROP VIEW metrica_test_slow_readings")
            .await
            .unwrap();
        assert_eq!(lingering, 0);
    }
}
