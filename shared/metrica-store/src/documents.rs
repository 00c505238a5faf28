//! JSONB document collections
//!
//! A collection is one table `(id TEXT PRIMARY KEY, doc JSONB, updated_at
//! TIMESTAMPTZ)`. Writes are keyed upserts that replace the whole document.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;
use tracing::{debug, instrument};

use crate::{Result, StoreClient, StoreError};

const MAX_IDENTIFIER_LEN: usize = 63;

/// A document addressed by `id`
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn from_serialize<T: serde::Serialize>(
        id: impl Into<String>,
        value: &T,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            body: serde_json::to_value(value)?,
            updated_at,
        })
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_head && valid_tail && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(StoreError::Configuration(format!(
            "invalid table name {:?}",
            name
        )))
    }
}

/// Named collection of JSONB documents
#[derive(Debug, Clone)]
pub struct DocumentCollection {
    name: String,
}

impl DocumentCollection {
    pub fn new(name: &str) -> Result<Self> {
        validate_identifier(name)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                id TEXT PRIMARY KEY, \
                doc JSONB NOT NULL, \
                updated_at TIMESTAMPTZ NOT NULL)",
            self.name
        )
    }

    fn upsert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, doc, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at",
            self.name
        )
    }

    fn find_sql(&self) -> String {
        format!("SELECT doc FROM {} WHERE id = $1", self.name)
    }

    /// Create-or-replace every document in a single transaction.
    ///
    /// Either all documents land or none do. Returns the number of rows written.
    #[instrument(skip(self, client, documents), fields(collection = %self.name, documents = documents.len()))]
    pub async fn upsert_all(&self, client: &mut StoreClient, documents: &[Document]) -> Result<u64> {
        let tx = client.transaction().await?;
        tx.batch_execute(&self.create_sql()).await?;

        let statement = tx.prepare(&self.upsert_sql()).await?;
        let mut written = 0;
        for document in documents {
            written += tx
                .execute(&statement, &[&document.id, &document.body, &document.updated_at])
                .await?;
        }

        tx.commit().await?;
        debug!(written, "Documents upserted");
        Ok(written)
    }

    /// Fetch one document body. A collection that was never written reads as empty.
    pub async fn find_one(&self, client: &Client, id: &str) -> Result<Option<Value>> {
        match client.query_opt(&self.find_sql(), &[&id]).await {
            Ok(Some(row)) => Ok(Some(row.try_get::<_, Value>(0)?)),
            Ok(None) => Ok(None),
            Err(e) if e.code() == Some(&SqlState::UNDEFINED_TABLE) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
