//! HTTP handlers for Auth Service

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use metrica_core::{Credentials, ValidationResponse};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::AppState;

pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Check a credential pair.
///
/// The body is read raw: a malformed or non-JSON body counts as empty
/// credentials and is rejected like any other mismatch.
pub async fn validate(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<ValidationResponse>) {
    let credentials: Credentials = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!(error = %e, "Unreadable validation body");
        Credentials::default()
    });

    if state.directory.verify(&credentials) {
        debug!(username = %credentials.username.trim(), "Credentials accepted");
        (
            StatusCode::OK,
            Json(ValidationResponse {
                ok: true,
                message: None,
            }),
        )
    } else {
        info!(username = %credentials.username.trim(), "Credentials rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(ValidationResponse {
                ok: false,
                message: Some(INVALID_CREDENTIALS.to_string()),
            }),
        )
    }
}
