//! Analytics Sync
//!
//! Scheduled job republishing per-metric summary statistics:
//! - Aggregate Reader: min/max/avg/count per metric from the readings table
//! - Materializer: idempotent whole-document upserts, one per metric
//! - Sync Scheduler: fixed-interval loop with per-cycle fault isolation
//! - Status API: /health, /ready, /status

use metrica_core::{MetricaError, MetricaService, MicroserviceRuntime, ReadinessStatus, Result};
use metrica_store::DocumentCollection;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

mod aggregate;
mod api;
mod config;
mod error;
mod materialize;
mod policy;
mod scheduler;

#[cfg(test)]
mod testing;

use aggregate::PgAggregateReader;
use config::SyncConfig;
use error::SyncError;
use materialize::PgDocumentSink;
use scheduler::{SharedStatus, SyncMetrics, SyncScheduler};

type PgScheduler = SyncScheduler<PgAggregateReader, PgDocumentSink>;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = metrica_telemetry::init("analytics-sync")
        .map_err(|e| MetricaError::Telemetry(e.to_string()))?;

    info!("Starting Analytics Sync");

    let service = match AnalyticsSyncService::new() {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Invalid configuration, not starting sync loop");
            return Err(MetricaError::Config(e.to_string()));
        }
    };
    MicroserviceRuntime::run(service).await
}

pub struct AnalyticsSyncService {
    config: SyncConfig,
    status: SharedStatus,
    metrics: SyncMetrics,
    scheduler: Mutex<Option<PgScheduler>>,
    start_time: Instant,
}

impl AnalyticsSyncService {
    pub fn new() -> std::result::Result<Self, SyncError> {
        let config = SyncConfig::from_env()?;

        let reader = PgAggregateReader::new(config.source.clone(), &config.source_table);
        let collection =
            DocumentCollection::new(&config.sink_collection).map_err(error::configuration)?;
        let sink = PgDocumentSink::new(config.sink.clone(), collection);
        let scheduler = SyncScheduler::new(reader, sink, config.policy.clone());

        Ok(Self {
            status: scheduler.status(),
            metrics: scheduler.metrics(),
            scheduler: Mutex::new(Some(scheduler)),
            config,
            start_time: Instant::now(),
        })
    }

    async fn serve_status(&self) -> Result<()> {
        let app = api::create_router(api::ApiState {
            status: self.status.clone(),
            metrics: self.metrics.clone(),
            started: self.start_time,
        });

        let listener = tokio::net::TcpListener::bind(&self.config.service.http_bind).await?;
        info!(
            service = %self.config.service.service_name,
            http = %self.config.service.http_bind,
            "Status API listening"
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetricaService for AnalyticsSyncService {
    fn service_id(&self) -> &'static str {
        "analytics-sync"
    }

    async fn ready(&self) -> ReadinessStatus {
        self.status.read().readiness()
    }

    async fn shutdown(&self) -> Result<()> {
        let status = self.status.read().clone();
        info!(
            cycles = status.cycles,
            cycles_failed = status.cycles_failed,
            "Shutting down Analytics Sync"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let scheduler = self
            .scheduler
            .lock()
            .take()
            .ok_or_else(|| MetricaError::Config("sync scheduler already started".into()))?;

        info!(
            source_table = %self.config.source_table,
            collection = %self.config.sink_collection,
            interval_secs = self.config.policy.interval.as_secs(),
            "Starting sync loop"
        );
        let sync_loop = tokio::spawn(scheduler.run_forever());

        // The status endpoint is optional; the loop keeps running without it
        if let Err(e) = self.serve_status().await {
            error!(error = %e, "Status API stopped");
        }

        if let Err(e) = sync_loop.await {
            error!(error = %e, "Sync loop aborted");
        }
        Ok(())
    }
}
