//! In-memory stores for pipeline tests

use async_trait::async_trait;
use metrica_core::{MetricDocument, MetricSummary};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::aggregate::AggregateSource;
use crate::error::{Result, SyncError};
use crate::materialize::DocumentSink;

#[derive(Default)]
struct SourceState {
    readings: Vec<(String, String, f64)>,
    fail_next: u32,
    hang: bool,
    calls: usize,
}

/// Readings table that aggregates like the grouped query does
#[derive(Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<SourceState>>,
}

impl MemorySource {
    pub fn with_readings(readings: &[(&str, &str, f64)]) -> Self {
        let source = Self::default();
        for (user, metric, value) in readings {
            source.insert(user, metric, *value);
        }
        source
    }

    pub fn insert(&self, user: &str, metric: &str, value: f64) {
        self.state
            .lock()
            .readings
            .push((user.to_string(), metric.to_string(), value));
    }

    pub fn clear(&self) {
        self.state.lock().readings.clear();
    }

    pub fn fail_next(&self, cycles: u32) {
        self.state.lock().fail_next = cycles;
    }

    pub fn hang(&self) {
        self.state.lock().hang = true;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }
}

#[async_trait]
impl AggregateSource for MemorySource {
    async fn fetch_summaries(&self) -> Result<Vec<MetricSummary>> {
        let hang = {
            let mut state = self.state.lock();
            state.calls += 1;
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(SyncError::SourceUnavailable("connection refused".into()));
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let state = self.state.lock();
        let mut groups: BTreeMap<&str, (f64, f64, f64, u64)> = BTreeMap::new();
        for (_, metric, value) in &state.readings {
            let entry = groups
                .entry(metric.as_str())
                .or_insert((f64::INFINITY, f64::NEG_INFINITY, 0.0, 0));
            entry.0 = entry.0.min(*value);
            entry.1 = entry.1.max(*value);
            entry.2 += value;
            entry.3 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(metric, (min, max, sum, count))| MetricSummary {
                metric: metric.to_string(),
                min: Some(min),
                max: Some(max),
                avg: Some(sum / count as f64),
                count,
            })
            .collect())
    }
}

#[derive(Default)]
struct SinkState {
    documents: BTreeMap<String, MetricDocument>,
    batches: usize,
    fail_next: u32,
    hang: bool,
}

/// Document collection keyed by metric, all-or-nothing per batch
#[derive(Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn get(&self, metric: &str) -> Option<MetricDocument> {
        self.state.lock().documents.get(metric).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().documents.len()
    }

    /// Successful batch calls so far
    pub fn batches(&self) -> usize {
        self.state.lock().batches
    }

    pub fn fail_next(&self, batches: u32) {
        self.state.lock().fail_next = batches;
    }

    pub fn hang(&self) {
        self.state.lock().hang = true;
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn upsert_batch(&self, documents: &[MetricDocument]) -> Result<u64> {
        let hang = {
            let mut state = self.state.lock();
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(SyncError::SinkUnavailable("bulk write rejected".into()));
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock();
        for document in documents {
            state
                .documents
                .insert(document.metric.clone(), document.clone());
        }
        state.batches += 1;
        Ok(documents.len() as u64)
    }
}
