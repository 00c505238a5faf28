//! Status API for Analytics Sync
//!
//! Passive view of the pipeline; consumers still judge freshness by the
//! documents' `updated_at`.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use metrica_core::ReadinessStatus;
use metrica_telemetry::HistogramSnapshot;
use serde::Serialize;
use std::time::Instant;

use crate::scheduler::{SharedStatus, SyncMetrics, SyncStatus};

#[derive(Clone)]
pub struct ApiState {
    pub status: SharedStatus,
    pub metrics: SyncMetrics,
    pub started: Instant,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .with_state(state)
}

#[derive(Serialize)]
struct StatusResponse {
    uptime_secs: u64,
    sync: SyncStatus,
    documents_written_total: u64,
    cycle_duration_ms: HistogramSnapshot,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 503 until at least one cycle has landed.
async fn ready(State(state): State<ApiState>) -> (StatusCode, Json<ReadinessStatus>) {
    let readiness = state.status.read().readiness();
    let code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(readiness))
}

async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let sync = state.status.read().clone();
    Json(StatusResponse {
        uptime_secs: state.started.elapsed().as_secs(),
        sync,
        documents_written_total: state.metrics.documents.get(),
        cycle_duration_ms: state.metrics.cycle_duration_ms.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> ApiState {
        ApiState {
            status: SharedStatus::default(),
            metrics: SyncMetrics::default(),
            started: Instant::now(),
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let code = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (code, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_ready_before_first_success() {
        let (code, body) = get_json(create_router(state()), "/ready").await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
    }

    #[tokio::test]
    async fn test_ready_after_success() {
        let state = state();
        state.status.write().last_success_at = Some(chrono::Utc::now());
        let (code, body) = get_json(create_router(state), "/ready").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["dependencies"][0]["name"], "source-of-record");
    }

    #[tokio::test]
    async fn test_status_reports_snapshot() {
        let state = state();
        state.metrics.documents.add(4);
        {
            let mut status = state.status.write();
            status.cycles = 3;
            status.cycles_failed = 1;
            status.last_error = Some("Sink unavailable: bulk write rejected".into());
        }

        let (code, body) = get_json(create_router(state), "/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["sync"]["state"], "idle");
        assert_eq!(body["sync"]["cycles"], 3);
        assert_eq!(body["sync"]["cycles_failed"], 1);
        assert_eq!(body["documents_written_total"], 4);
    }

    #[tokio::test]
    async fn test_health() {
        let (code, body) = get_json(create_router(state()), "/health").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
