//! Configuration for Ingest Service

use metrica_core::config::{env_or, env_parse};
use metrica_core::{MetricaError, Result};
use metrica_store::{validate_identifier, Endpoint, StoreConfig};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub host: String,
    pub port: u16,
    /// Source of record receiving readings
    pub source: StoreConfig,
    pub table: String,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        let source = StoreConfig::new(Endpoint::Params {
            host: env_or("SOURCE_DB_HOST", "localhost"),
            port: env_parse("SOURCE_DB_PORT", 5432u16)?,
            user: env_or("SOURCE_DB_USER", "project-user"),
            password: env_or("SOURCE_DB_PASSWORD", "project-passwd"),
            dbname: env_or("SOURCE_DB_NAME", "projectdb"),
        })
        .with_connect_timeout(Duration::from_secs(env_parse(
            "SOURCE_CONNECT_TIMEOUT_SECS",
            5u64,
        )?))
        .with_max_size(env_parse("SOURCE_POOL_SIZE", 16usize)?);

        let table = env_or("SOURCE_TABLE", "readings");
        validate_identifier(&table).map_err(|e| MetricaError::Config(e.to_string()))?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 5000u16)?,
            source,
            table,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
