//! Document lookup against the materialized collection

use async_trait::async_trait;
use metrica_store::{DocumentCollection, Result, StorePool};
use serde_json::Value;
use tracing::debug;

#[async_trait]
pub trait DocumentLookup: Send + Sync {
    /// The document stored under `metric`, if any.
    async fn find(&self, metric: &str) -> Result<Option<Value>>;
}

pub struct PgDocumentLookup {
    pool: StorePool,
    collection: DocumentCollection,
}

impl PgDocumentLookup {
    pub fn new(pool: StorePool, collection: DocumentCollection) -> Self {
        Self { pool, collection }
    }
}

#[async_trait]
impl DocumentLookup for PgDocumentLookup {
    async fn find(&self, metric: &str) -> Result<Option<Value>> {
        let conn = self.pool.get().await?;
        let document = self.collection.find_one(&conn, metric).await?;
        debug!(
            collection = self.collection.name(),
            metric,
            found = document.is_some(),
            "Document lookup"
        );
        Ok(document)
    }
}
