//! Error types for Ingest Service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrica_store::StoreError;
use serde_json::json;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid value. Must be numeric.")]
    InvalidValue,

    #[error("Value out of range for {metric}. Allowed: {min} to {max}.")]
    OutOfRange { metric: String, min: f64, max: f64 },

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Auth failed. Invalid credentials.")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IngestError::InvalidValue
            | IngestError::OutOfRange { .. }
            | IngestError::InvalidField(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            IngestError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            IngestError::Store(e) => {
                tracing::error!(error = %e, "Reading insert failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Reading could not be stored".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
