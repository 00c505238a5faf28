//! Error types for Metrica services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricaError>;

#[derive(Error, Debug)]
pub enum MetricaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl MetricaError {
    /// Startup errors that should stop the process before any work loop runs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Telemetry(_))
    }
}

impl From<std::io::Error> for MetricaError {
    fn from(err: std::io::Error) -> Self {
        MetricaError::Network(err.to_string())
    }
}
