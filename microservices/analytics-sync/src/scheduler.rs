//! Sync Scheduler
//!
//! Drives Aggregate Reader -> Materializer forever, one cycle at a time:
//!
//! ```text
//! IDLE -> RUNNING_CYCLE -> (SUCCESS | FAILED) -> SLEEPING -> IDLE -> ...
//! ```
//!
//! A failed cycle is logged and dropped; the next one starts from a fresh
//! query after the sleep. There is no terminal state.

use chrono::{DateTime, Utc};
use metrica_core::{DependencyStatus, ReadinessStatus};
use metrica_telemetry::{Counter, Gauge, Histogram};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};

use crate::aggregate::AggregateSource;
use crate::error::{Result, SyncError};
use crate::materialize::{DocumentSink, Materializer};
use crate::policy::{CircuitBreaker, CircuitState, SchedulePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    RunningCycle,
    Success,
    Failed,
    /// Breaker open; the cycle made no store calls
    Skipped,
    Sleeping,
}

/// Result of one pass through the pipeline
#[derive(Debug)]
pub enum CycleOutcome {
    Success { documents: u64 },
    Failed(SyncError),
    /// Circuit breaker open; no store was called
    Skipped,
}

/// Snapshot published for the HTTP surface
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub state: CycleState,
    pub cycles: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
    pub consecutive_failures: u32,
    pub last_documents: u64,
    pub last_error: Option<String>,
    pub last_error_kind: Option<&'static str>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub circuit: Option<CircuitState>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            state: CycleState::Idle,
            cycles: 0,
            cycles_failed: 0,
            cycles_skipped: 0,
            consecutive_failures: 0,
            last_documents: 0,
            last_error: None,
            last_error_kind: None,
            last_success_at: None,
            circuit: None,
        }
    }
}

impl SyncStatus {
    /// Ready once a cycle has landed. A dependency reads as down while the
    /// current failure streak is attributed to it.
    pub fn readiness(&self) -> ReadinessStatus {
        let failing = |kind: &str| {
            self.consecutive_failures > 0 && self.last_error_kind == Some(kind)
        };
        let dependency = |name: &str, kind: &str| DependencyStatus {
            name: name.to_string(),
            available: !failing(kind),
            latency_ms: None,
        };

        ReadinessStatus {
            ready: self.last_success_at.is_some(),
            dependencies: vec![
                dependency("source-of-record", "source_unavailable"),
                dependency("document-store", "sink_unavailable"),
            ],
        }
    }
}

pub type SharedStatus = Arc<RwLock<SyncStatus>>;

/// Pipeline counters
#[derive(Clone)]
pub struct SyncMetrics {
    pub cycles: Counter,
    pub failures: Counter,
    pub documents: Counter,
    pub last_success_unix: Gauge,
    pub cycle_duration_ms: Histogram,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self {
            cycles: Counter::new("sync_cycles_total"),
            failures: Counter::new("sync_cycles_failed_total"),
            documents: Counter::new("sync_documents_written_total"),
            last_success_unix: Gauge::new("sync_last_success_unix"),
            cycle_duration_ms: Histogram::new("sync_cycle_duration_ms"),
        }
    }
}

pub struct SyncScheduler<A, S> {
    source: A,
    materializer: Materializer<S>,
    policy: SchedulePolicy,
    breaker: Option<CircuitBreaker>,
    status: SharedStatus,
    metrics: SyncMetrics,
    consecutive_failures: u32,
    cycle: u64,
}

impl<A: AggregateSource, S: DocumentSink> SyncScheduler<A, S> {
    pub fn new(source: A, sink: S, policy: SchedulePolicy) -> Self {
        let breaker = policy.breaker.map(CircuitBreaker::new);
        let status = SyncStatus {
            circuit: breaker.as_ref().map(CircuitBreaker::state),
            ..SyncStatus::default()
        };

        Self {
            source,
            materializer: Materializer::new(sink),
            policy,
            breaker,
            status: Arc::new(RwLock::new(status)),
            metrics: SyncMetrics::default(),
            consecutive_failures: 0,
            cycle: 0,
        }
    }

    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.metrics.clone()
    }

    /// Loop until the process is killed.
    pub async fn run_forever(mut self) {
        info!(
            interval_secs = self.policy.interval.as_secs(),
            backoff = self.policy.backoff.is_some(),
            breaker = self.policy.breaker.is_some(),
            "Sync scheduler starting"
        );

        loop {
            self.run_cycle().await;

            let delay = self.policy.delay_after(self.consecutive_failures);
            self.set_state(CycleState::Sleeping);
            tokio::time::sleep(delay).await;
            self.set_state(CycleState::Idle);
        }
    }

    /// Run one cycle and record its outcome. Never panics on store errors.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let allowed = self
            .breaker
            .as_mut()
            .map_or(true, CircuitBreaker::allow_cycle);
        if !allowed {
            warn!("Circuit breaker open, skipping sync cycle");
            self.publish(CycleState::Skipped, |status| status.cycles_skipped += 1);
            return CycleOutcome::Skipped;
        }

        self.cycle += 1;
        self.set_state(CycleState::RunningCycle);
        let started = Instant::now();

        let result = self.execute().await;

        let duration_ms = started.elapsed().as_millis() as u64;
        self.metrics.cycles.inc();
        self.metrics.cycle_duration_ms.record(duration_ms as f64);

        match result {
            Ok(documents) => {
                self.consecutive_failures = 0;
                if let Some(breaker) = self.breaker.as_mut() {
                    breaker.record_success();
                }

                let now = Utc::now();
                self.metrics.documents.add(documents);
                self.metrics.last_success_unix.set(now.timestamp().max(0) as u64);

                info!(cycle = self.cycle, metrics = documents, duration_ms, "Updated {} metric(s)", documents);

                self.publish(CycleState::Success, |status| {
                    status.last_documents = documents;
                    status.last_error = None;
                    status.last_error_kind = None;
                    status.last_success_at = Some(now);
                });
                CycleOutcome::Success { documents }
            }
            Err(err) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if let Some(breaker) = self.breaker.as_mut() {
                    breaker.record_failure();
                }
                self.metrics.failures.inc();

                error!(
                    cycle = self.cycle,
                    kind = err.kind(),
                    error = %err,
                    consecutive_failures = self.consecutive_failures,
                    duration_ms,
                    "Sync cycle failed"
                );

                let message = err.to_string();
                let kind = err.kind();
                self.publish(CycleState::Failed, |status| {
                    status.cycles_failed += 1;
                    status.last_error = Some(message);
                    status.last_error_kind = Some(kind);
                });
                CycleOutcome::Failed(err)
            }
        }
    }

    async fn execute(&self) -> Result<u64> {
        let summaries = timeout(self.policy.source_timeout, self.source.fetch_summaries())
            .await
            .map_err(|_| {
                SyncError::SourceUnavailable(format!(
                    "aggregate query timed out after {}s",
                    self.policy.source_timeout.as_secs()
                ))
            })??;

        let now = Utc::now();
        timeout(self.policy.sink_timeout, self.materializer.materialize(&summaries, now))
            .await
            .map_err(|_| {
                SyncError::SinkUnavailable(format!(
                    "batch write timed out after {}s",
                    self.policy.sink_timeout.as_secs()
                ))
            })?
    }

    fn set_state(&self, state: CycleState) {
        self.status.write().state = state;
    }

    fn publish(&self, state: CycleState, update: impl FnOnce(&mut SyncStatus)) {
        let mut status = self.status.write();
        status.state = state;
        status.cycles = self.cycle;
        status.consecutive_failures = self.consecutive_failures;
        status.circuit = self.breaker.as_ref().map(CircuitBreaker::state);
        update(&mut status);
    }
}
