//! Error types for Results Service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrica_store::StoreError;
use serde_json::json;

pub type Result<T> = std::result::Result<T, ResultsError>;

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("Invalid username or password. Please try again.")]
    Unauthorized,

    #[error("No analytics data found for the metric '{0}'. Try submitting some data first.")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ResultsError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ResultsError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ResultsError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ResultsError::Store(e) => {
                tracing::error!(error = %e, "Document lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while fetching analytics data.".to_string(),
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
