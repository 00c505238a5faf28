//! Metrica Telemetry
//!
//! Structured logging for every service binary, plus the small in-process
//! counters the sync loop reports through its status endpoint.

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{Counter, Gauge, Histogram, HistogramSnapshot};
pub use tracing_setup::init_tracing;

/// Configure logging from the environment. Keep the guard alive for the
/// lifetime of `main`.
pub fn init(service_name: &str) -> Result<TelemetryGuard, TelemetryError> {
    let config = TelemetryConfig::from_env(service_name)?;
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Marks the end of a service's log stream when dropped
#[must_use = "dropping the guard ends the service's log stream"]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Service exiting");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Invalid telemetry configuration: {0}")]
    Config(String),
}
