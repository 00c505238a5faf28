//! Auth Service
//!
//! Credential Validator for the metric pipeline. Answers whether a
//! (username, password) pair belongs to the configured user directory.

mod config;
mod directory;
mod handlers;
mod routes;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use config::AuthConfig;
pub use directory::CredentialDirectory;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<CredentialDirectory>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = metrica_telemetry::init("auth-service")?;

    info!("Starting Auth Service");

    let config = AuthConfig::from_env()?;
    let bind_addr = config.bind_address();
    info!(users = config.directory.len(), "User directory loaded");

    let state = AppState {
        directory: Arc::new(config.directory),
    };
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Auth Service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
