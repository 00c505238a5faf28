//! HTTP handlers for Ingest Service

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form, Json,
};
use metrica_auth_client::CredentialValidator;
use metrica_core::{Credentials, MetricName, Reading};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{IngestError, Result};
use crate::AppState;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>Submit a reading</title></head>
<body>
  <h1>Submit a reading</h1>
  <form method="post" action="/submit">
    <label>Username <input name="username" required></label><br>
    <label>Password <input name="password" type="password" required></label><br>
    <label>Metric <input name="metric" placeholder="grade, temperature, humidity, pressure" required></label><br>
    <label>Value <input name="value" required></label><br>
    <button type="submit">Submit</button>
  </form>
</body>
</html>
"#;

/// Submitted form; every field is optional on the wire and defaults to empty
#[derive(Debug, Default, Deserialize, validator::Validate)]
pub struct SubmitForm {
    #[serde(default)]
    #[validate(length(max = 128))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 128))]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub metric: String,

    #[serde(default)]
    pub value: String,
}

impl SubmitForm {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
            metric: MetricName::normalize(&self.metric).as_str().to_string(),
            value: self.value.trim().to_string(),
        }
    }

    fn check_fields(&self) -> Result<()> {
        validator::Validate::validate(self).map_err(|e| IngestError::InvalidField(e.to_string()))
    }
}

/// Only finite numbers are readings; `NaN` and `inf` parse but are refused.
fn parse_value(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(IngestError::InvalidValue)
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = state.store.is_healthy().await;
    let code = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!({ "ready": database, "database": database })))
}

/// Validate, authenticate and store one reading.
///
/// Checks run in a fixed order: value, form fields, metric bounds,
/// credentials. Nothing is written unless all of them pass.
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Result<(StatusCode, Json<Reading>)> {
    let form = form.normalized();

    let value = parse_value(&form.value)?;
    form.check_fields()?;

    let metric = MetricName::normalize(&form.metric);
    if let Some(rule) = state.rules.get(&metric) {
        if !rule.allows(value) {
            return Err(IngestError::OutOfRange {
                metric: metric.to_string(),
                min: rule.min,
                max: rule.max,
            });
        }
    }

    let credentials = Credentials::new(&form.username, &form.password);
    if !state.validator.validate(&credentials).await {
        info!(username = %credentials.username, "Submission rejected, invalid credentials");
        return Err(IngestError::Unauthorized);
    }

    let reading = state.store.insert(&credentials.username, &metric, value).await?;
    info!(username = %reading.username, metric = %reading.metric, value, "Reading accepted");

    Ok((StatusCode::CREATED, Json(reading)))
}
