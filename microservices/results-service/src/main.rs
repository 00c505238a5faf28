//! Results Service
//!
//! Authenticated read path over the materialized analytics collection.
//! Serves whatever analytics-sync last wrote; it never computes aggregates.

mod config;
mod error;
mod handlers;
mod lookup;
mod routes;

use metrica_auth_client::{CredentialValidator, HttpCredentialValidator};
use metrica_store::{DocumentCollection, StorePool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use config::ResultsConfig;
use lookup::{DocumentLookup, PgDocumentLookup};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentLookup>,
    pub validator: Arc<dyn CredentialValidator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = metrica_telemetry::init("results-service")?;

    info!("Starting Results Service");

    let config = ResultsConfig::from_env()?;
    let bind_addr = config.bind_address();

    let pool = StorePool::new(&config.sink)?;
    let collection = DocumentCollection::new(&config.collection)?;
    let validator = HttpCredentialValidator::from_env()?;
    info!(auth_url = %validator.url(), collection = %config.collection, "Dependencies configured");

    let state = AppState {
        documents: Arc::new(PgDocumentLookup::new(pool, collection)),
        validator: Arc::new(validator),
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Results Service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
