//! Telemetry Configuration

use metrica_core::config::{env_flag, env_or};

use crate::TelemetryError;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            log_level: "info".to_string(),
            json_logs: true,
        }
    }

    pub fn from_env(service_name: &str) -> Result<Self, TelemetryError> {
        Ok(Self {
            service_name: env_or("SERVICE_NAME", service_name),
            log_level: env_or("RUST_LOG", "info"),
            json_logs: env_flag("JSON_LOGS", true)
                .map_err(|e| TelemetryError::Config(e.to_string()))?,
        })
    }
}
