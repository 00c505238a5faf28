//! Log subscriber installation

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{TelemetryConfig, TelemetryError};

/// Install the process-wide subscriber.
///
/// JSON output flattens event fields to the top level so log shippers can
/// index `cycle`, `metrics` and `duration_ms` directly.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| {
        TelemetryError::TracingInit(format!("invalid log filter {:?}: {}", config.log_level, e))
    })?;

    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json_logs {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        fmt::layer().compact().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        filter = %config.log_level,
        json = config.json_logs,
        "Logging ready"
    );

    Ok(())
}
