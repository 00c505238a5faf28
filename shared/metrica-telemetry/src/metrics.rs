//! In-process metric primitives
//!
//! Cheap to clone: clones share the same underlying value, so a scheduler
//! can update a metric while an HTTP handler reads it.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DEFAULT_WINDOW: usize = 1024;

#[derive(Clone)]
struct Cell {
    name: Arc<str>,
    value: Arc<AtomicU64>,
}

impl Cell {
    fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Monotonic counter
#[derive(Clone)]
pub struct Counter(Cell);

impl Counter {
    pub fn new(name: &str) -> Self {
        Self(Cell::new(name))
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

/// Last-value gauge
#[derive(Clone)]
pub struct Gauge(Cell);

impl Gauge {
    pub fn new(name: &str) -> Self {
        Self(Cell::new(name))
    }

    pub fn set(&self, value: u64) {
        self.0.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

/// Sliding window of the most recent samples
#[derive(Clone)]
pub struct Histogram {
    name: Arc<str>,
    window: Arc<Mutex<VecDeque<f64>>>,
    capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    pub samples: usize,
    pub mean: f64,
    pub p50: f64,
    pub p99: f64,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self::with_capacity(name, DEFAULT_WINDOW)
    }

    pub fn with_capacity(name: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: Arc::from(name),
            window: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_WINDOW)))),
            capacity,
        }
    }

    pub fn record(&self, value: f64) {
        let mut window = self.window.lock();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(value);
    }

    pub fn percentile(&self, p: f64) -> f64 {
        percentile_of(&self.sorted(), p)
    }

    pub fn mean(&self) -> f64 {
        mean_of(self.window.lock().iter().copied())
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let sorted = self.sorted();
        HistogramSnapshot {
            samples: sorted.len(),
            mean: mean_of(sorted.iter().copied()),
            p50: percentile_of(&sorted, 50.0),
            p99: percentile_of(&sorted, 99.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn sorted(&self) -> Vec<f64> {
        let mut samples: Vec<f64> = self.window.lock().iter().copied().collect();
        samples.sort_by(f64::total_cmp);
        samples
    }
}

fn mean_of(samples: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    samples.sum::<f64>() / n as f64
}

/// Nearest-rank percentile over already sorted samples.
fn percentile_of(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n => sorted[((n as f64 * p / 100.0) as usize).min(n - 1)],
    }
}
