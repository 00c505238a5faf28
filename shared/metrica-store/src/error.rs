//! Store errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Handshake or authentication with the server failed
    #[error("cannot reach store: {0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("statement failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// No pooled connection within the wait timeout
    #[error("no pooled connection: {0}")]
    Pool(String),

    #[error("invalid store configuration: {0}")]
    Configuration(String),

    #[error("document encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
