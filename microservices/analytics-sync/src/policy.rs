//! Retry Policy
//!
//! The default policy is a fixed interval between cycles, whatever the
//! outcome. Exponential backoff with jitter and a circuit breaker can be
//! switched on from configuration; neither is active unless asked for.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Cycle pacing and per-call bounds
#[derive(Debug, Clone)]
pub struct SchedulePolicy {
    /// Sleep between cycles
    pub interval: Duration,
    /// Upper bound on the aggregate query
    pub source_timeout: Duration,
    /// Upper bound on the batch write
    pub sink_timeout: Duration,
    pub backoff: Option<Backoff>,
    pub breaker: Option<BreakerPolicy>,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_INTERVAL)
    }
}

impl SchedulePolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            source_timeout: DEFAULT_CALL_TIMEOUT,
            sink_timeout: DEFAULT_CALL_TIMEOUT,
            backoff: None,
            breaker: None,
        }
    }

    /// Sleep to take after a cycle, given the failures seen in a row so far.
    pub fn delay_after(&self, consecutive_failures: u32) -> Duration {
        match &self.backoff {
            Some(backoff) if consecutive_failures > 0 => {
                backoff.delay(self.interval, consecutive_failures)
            }
            _ => self.interval,
        }
    }
}

/// Exponential backoff applied only while cycles keep failing
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Backoff {
    fn delay(&self, base: Duration, consecutive_failures: u32) -> Duration {
        let factor = 1u32 << consecutive_failures.min(16);
        let ceiling = self.max_delay.max(base);
        let delay = base.saturating_mul(factor).min(ceiling);

        if !self.jitter {
            return delay;
        }

        let millis = delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
    }
}

/// When to stop calling the stores after repeated failures
#[derive(Debug, Clone, Copy)]
pub struct BreakerPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Cycles run normally
    Closed,
    /// Cycles are skipped until the cooldown passes
    Open,
    /// One trial cycle decides whether to close again
    HalfOpen,
}

/// Cycle-level circuit breaker.
///
/// Owned by the scheduler; a single worker drives it, so no locking.
#[derive(Debug)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    /// Whether the next cycle may touch the stores.
    pub fn allow_cycle(&mut self) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = self
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.policy.cooldown)
                    .unwrap_or(true);
                if cooled {
                    self.state = CircuitState::HalfOpen;
                    info!("Circuit breaker half-open, running trial cycle");
                }
                cooled
            }
        }
    }

    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            info!("Circuit breaker closed after recovery");
        }
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.open();
                warn!("Circuit breaker re-opened after trial failure");
            }
            CircuitState::Closed if self.consecutive_failures >= self.policy.failure_threshold => {
                self.open();
                warn!(
                    failures = self.consecutive_failures,
                    "Circuit breaker opened after threshold"
                );
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
    }
}
