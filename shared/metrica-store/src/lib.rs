//! Metrica Store
//!
//! PostgreSQL wire-protocol client used for both sides of the pipeline:
//! the relational source of record and the JSONB document collections.
//! Provides per-use connections, connection pooling and keyed upserts.

mod client;
mod config;
mod documents;
mod error;
mod pool;

pub use client::StoreClient;
pub use config::{Endpoint, StoreConfig};
pub use documents::{validate_identifier, Document, DocumentCollection};
pub use error::{Result, StoreError};
pub use pool::StorePool;

pub use tokio_postgres::Row;
