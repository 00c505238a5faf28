//! HTTP handlers for Results Service

use axum::{extract::State, response::Html, Form, Json};
use metrica_auth_client::CredentialValidator;
use metrica_core::{Credentials, MetricName};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{Result, ResultsError};
use crate::lookup::DocumentLookup;
use crate::AppState;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>Metric analytics</title></head>
<body>
  <h1>Metric analytics</h1>
  <form method="post" action="/show">
    <label>Username <input name="username" required></label><br>
    <label>Password <input name="password" type="password" required></label><br>
    <label>Metric <input name="metric" required></label><br>
    <button type="submit">Show</button>
  </form>
</body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
pub struct ShowForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub metric: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Return the materialized document for one metric.
///
/// Credentials are checked before the store is touched. The document is
/// returned as stored, including its `updated_at` freshness stamp.
pub async fn show(State(state): State<AppState>, Form(form): Form<ShowForm>) -> Result<Json<Value>> {
    let credentials = Credentials::new(&form.username, &form.password);
    if !state.validator.validate(&credentials).await {
        info!(username = %credentials.username, "Lookup rejected, invalid credentials");
        return Err(ResultsError::Unauthorized);
    }

    let metric = MetricName::normalize(&form.metric);
    match state.documents.find(metric.as_str()).await? {
        Some(document) => Ok(Json(document)),
        None => Err(ResultsError::NotFound(metric.to_string())),
    }
}
