//! Ingest Service
//!
//! Entry point for user-submitted readings. Each submission is range
//! checked per metric, authenticated against the Credential Validator and
//! appended to the source of record.

mod config;
mod error;
mod handlers;
mod routes;
mod store;

use metrica_auth_client::{CredentialValidator, HttpCredentialValidator};
use metrica_core::{MetricName, MetricRule};
use metrica_store::StorePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use config::IngestConfig;
use store::{PgReadingStore, ReadingStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub validator: Arc<dyn CredentialValidator>,
    pub rules: Arc<HashMap<MetricName, MetricRule>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = metrica_telemetry::init("ingest-service")?;

    info!("Starting Ingest Service");

    let config = IngestConfig::from_env()?;
    let bind_addr = config.bind_address();

    let pool = StorePool::new(&config.source)?;
    let validator = HttpCredentialValidator::from_env()?;
    info!(auth_url = %validator.url(), table = %config.table, "Dependencies configured");

    let state = AppState {
        store: Arc::new(PgReadingStore::new(pool, config.table.clone())),
        validator: Arc::new(validator),
        rules: Arc::new(metrica_core::default_metric_rules()),
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Ingest Service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
