//! Metrica Auth Client
//!
//! Client side of the Credential Validator. Services that accept user
//! submissions depend on the [`CredentialValidator`] trait; the HTTP
//! implementation talks to auth-service.

use async_trait::async_trait;
use metrica_core::{Credentials, ValidationResponse};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_AUTH_URL: &str = "http://auth_service:5000/validate";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Checks a (username, password) pair
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `true` only when the pair is positively authorized.
    async fn validate(&self, credentials: &Credentials) -> bool;
}

/// Credential Validator reached over HTTP
#[derive(Clone)]
pub struct HttpCredentialValidator {
    client: reqwest::Client,
    url: String,
}

impl HttpCredentialValidator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_env() -> Result<Self, reqwest::Error> {
        let url = std::env::var("AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());
        Self::new(url, DEFAULT_TIMEOUT)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, credentials: &Credentials) -> Result<bool, reqwest::Error> {
        let response = self
            .client
            .post(&self.url)
            .json(credentials)
            .send()
            .await?
            .error_for_status()?;
        let verdict: ValidationResponse = response.json().await?;
        Ok(verdict.ok)
    }
}

#[async_trait]
impl CredentialValidator for HttpCredentialValidator {
    async fn validate(&self, credentials: &Credentials) -> bool {
        match self.request(credentials).await {
            Ok(ok) => {
                debug!(username = %credentials.username, ok, "Credential check");
                ok
            }
            Err(e) => {
                // Rejections (401) land here too; only transport trouble is worth a warning
                if e.status().is_none() {
                    warn!(error = %e, url = %self.url, "Credential validator unreachable");
                }
                false
            }
        }
    }
}
