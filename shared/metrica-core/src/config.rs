//! Configuration management for microservices
//!
//! Every service reads its environment exactly once at startup into an
//! explicit config value. The helpers here keep parse failures fatal instead
//! of silently falling back to a default.

use crate::error::{MetricaError, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: String,
}

impl ServiceConfig {
    pub fn from_env(default_name: &str, default_bind: &str) -> Self {
        Self {
            service_name: env_or("SERVICE_NAME", default_name),
            http_bind: env_or("HTTP_BIND", default_bind),
        }
    }
}

/// Read `key`, falling back to `default` when unset.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse `key`, falling back to `default` when unset.
///
/// A value that is present but does not parse is a configuration error.
pub fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Read and parse `key` when present.
pub fn env_parse_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Read an on/off switch, falling back to `default` when unset or empty.
///
/// Accepts the spellings of [`parse_flag`]; anything else is a configuration error.
pub fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(default),
        Ok(raw) => parse_flag(&raw)
            .ok_or_else(|| MetricaError::Config(format!("Invalid {}={:?}: not a flag", key, raw))),
        Err(_) => Ok(default),
    }
}

/// `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`, case-insensitive.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| MetricaError::Config(format!("Invalid {}={:?}: {}", key, raw, e)))
}
