//! Store Client

use tokio_postgres::{Client, NoTls, Row, Transaction};
use tracing::{debug, instrument};

use crate::{Result, StoreConfig, StoreError};

/// Single dedicated connection.
///
/// The connection lives exactly as long as this value: dropping the client
/// closes the socket, so scoped use releases it on every exit path.
#[derive(Debug)]
pub struct StoreClient {
    client: Client,
}

impl StoreClient {
    #[instrument(skip(config))]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        debug!("Opening store connection");

        let (client, connection) = config
            .pg_config()?
            .connect(NoTls)
            .await
            .map_err(StoreError::Connection)?;

        // Drive the socket until the client is dropped
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Store connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    #[instrument(skip(self, params))]
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Row>> {
        Ok(self.client.query(sql, params).await?)
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<()> {
        Ok(self.client.batch_execute(sql).await?)
    }

    pub async fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.client.transaction().await?)
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub async fn is_healthy(&self) -> bool {
        self.client.simple_query("SELECT 1").await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Endpoint;

    #[tokio::test]
    async fn test_client_roundtrip() {
        // Requires a running PostgreSQL-compatible store
        let Ok(url) = std::env::var("METRICA_TEST_DB_URL") else {
            return;
        };

        let client = StoreClient::connect(&StoreConfig::new(Endpoint::Url(url)))
            .await
            .unwrap();
        assert!(client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let config = StoreConfig::new(Endpoint::Url("postgres://metrica@127.0.0.1:1/metrica".into()));
        let err = StoreClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_statement_timeout_cancels_on_server() {
        let Ok(url) = std::env::var("METRICA_TEST_DB_URL") else {
            return;
        };

        let config = StoreConfig::new(Endpoint::Url(url))
            .with_statement_timeout(std::time::Duration::from_millis(200));
        let client = StoreClient::connect(&config).await.unwrap();
        let err = client.query("SELECT pg_sleep(5)", &[]).await.unwrap_err();
        match err {
            StoreError::Query(e) => assert_eq!(
                e.code(),
                Some(&tokio_postgres::error::SqlState::QUERY_CANCELED)
            ),
            other => panic!("unexpected error: {other}"),
        }
    }
}
