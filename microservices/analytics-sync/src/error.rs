//! Error types for Analytics Sync

use metrica_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Source of record unreachable, query rejected or rows malformed
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Document store unreachable or batch write rejected
    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Missing or invalid parameters at startup
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SyncError {
    /// Short label for logs and status snapshots
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::SinkUnavailable(_) => "sink_unavailable",
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<metrica_core::MetricaError> for SyncError {
    fn from(err: metrica_core::MetricaError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Store configuration problems are only reachable at startup.
pub fn configuration(err: StoreError) -> SyncError {
    SyncError::Configuration(err.to_string())
}
