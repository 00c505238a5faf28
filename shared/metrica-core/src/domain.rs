//! Core domain types used across all microservices

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Metric name, always stored lowercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricName(String);

impl MetricName {
    /// Normalize user input: surrounding whitespace dropped, lowercased.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observation of a metric value by a user (append-only source of record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub username: String,
    pub metric: MetricName,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// Per-metric aggregate computed from the source of record in one cycle.
///
/// `min`, `max` and `avg` stay `None` when the store reports no value for
/// the group; they are never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: u64,
}

/// Materialized, lookup-ready document, keyed by `metric`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDocument {
    pub metric: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: u64,
    pub updated_at: DateTime<Utc>,
}

impl MetricDocument {
    pub fn from_summary(summary: &MetricSummary, now: DateTime<Utc>) -> Self {
        Self {
            metric: summary.metric.clone(),
            min: summary.min,
            max: summary.max,
            avg: summary.avg,
            count: summary.count,
            updated_at: now,
        }
    }

    /// Document identity, also the upsert match key.
    pub fn id(&self) -> &str {
        &self.metric
    }

    /// Aggregate fields only, ignoring `updated_at`.
    pub fn same_values(&self, other: &MetricDocument) -> bool {
        self.metric == other.metric
            && self.min == other.min
            && self.max == other.max
            && self.avg == other.avg
            && self.count == other.count
    }
}

/// Inclusive numeric bounds accepted for a metric on ingestion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub min: f64,
    pub max: f64,
}

impl MetricRule {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn allows(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Bounds for the well-known metrics; other metric names are unbounded.
pub fn default_metric_rules() -> HashMap<MetricName, MetricRule> {
    [
        ("grade", MetricRule::new(0.0, 100.0)),
        ("temperature", MetricRule::new(-50.0, 50.0)),
        ("humidity", MetricRule::new(0.0, 100.0)),
        ("pressure", MetricRule::new(0.0, 2000.0)),
    ]
    .into_iter()
    .map(|(name, rule)| (MetricName::normalize(name), rule))
    .collect()
}

/// Credential pair checked by the Credential Validator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
        }
    }
}

/// Credential Validator verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
