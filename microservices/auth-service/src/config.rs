//! Configuration for Auth Service

use metrica_core::config::{env_or, env_parse};
use metrica_core::Result;

use crate::directory::CredentialDirectory;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub host: String,
    pub port: u16,
    pub directory: CredentialDirectory,
}

impl AuthConfig {
    /// `AUTH_USERS` holds `user:password` pairs separated by commas; when
    /// unset the built-in demo directory is used.
    pub fn from_env() -> Result<Self> {
        let directory = match std::env::var("AUTH_USERS") {
            Ok(raw) if !raw.trim().is_empty() => CredentialDirectory::parse(&raw)?,
            _ => CredentialDirectory::default(),
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 5000u16)?,
            directory,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
