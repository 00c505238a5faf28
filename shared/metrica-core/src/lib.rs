//! Metrica Core - Shared domain types and service infrastructure
//!
//! This crate provides:
//! - Standard service trait all microservices implement
//! - Metric domain types (Reading, MetricSummary, MetricDocument, MetricRule)
//! - Error handling utilities
//! - Environment-driven configuration helpers

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use domain::*;
pub use error::{MetricaError, Result};
pub use service::{DependencyStatus, MetricaService, MicroserviceRuntime, ReadinessStatus};
