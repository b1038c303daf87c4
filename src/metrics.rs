//! Basic Metrics
//!
//! Operation counters and latency tracking for the matcher.

use hashbrown::HashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Operations the matcher records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Embed,
    Insert,
    Search,
    Score,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Embed => "embed",
            Operation::Insert => "insert",
            Operation::Search => "search",
            Operation::Score => "score",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Total operations count
    total_ops: AtomicU64,

    /// Operations that returned an error
    failed_ops: AtomicU64,

    /// Operations per kind
    ops_by_operation: RwLock<HashMap<Operation, u64>>,

    latency_sum_us: AtomicU64,
    latency_count: AtomicU64,
    latency_min_us: AtomicU64,
    latency_max_us: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            total_ops: AtomicU64::new(0),
            failed_ops: AtomicU64::new(0),
            ops_by_operation: RwLock::new(HashMap::new()),
            latency_sum_us: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            latency_min_us: AtomicU64::new(u64::MAX),
            latency_max_us: AtomicU64::new(0),
        }
    }

    /// Record a completed operation
    pub fn record_operation(&self, op: Operation, latency: Duration) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);

        *self.ops_by_operation.write().entry(op).or_insert(0) += 1;

        let latency_us = latency.as_micros() as u64;
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        self.latency_min_us.fetch_min(latency_us, Ordering::Relaxed);
        self.latency_max_us.fetch_max(latency_us, Ordering::Relaxed);
    }

    /// Record an operation that failed
    pub fn record_failure(&self, op: Operation, latency: Duration) {
        self.failed_ops.fetch_add(1, Ordering::Relaxed);
        self.record_operation(op, latency);
    }

    pub fn total_ops(&self) -> u64 {
        self.total_ops.load(Ordering::Relaxed)
    }

    pub fn failed_ops(&self) -> u64 {
        self.failed_ops.load(Ordering::Relaxed)
    }

    /// Count for one operation kind
    pub fn ops(&self, op: Operation) -> u64 {
        self.ops_by_operation.read().get(&op).copied().unwrap_or(0)
    }

    /// Get average latency in microseconds
    pub fn avg_latency_us(&self) -> f64 {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        sum as f64 / count as f64
    }

    /// Get min latency in microseconds
    pub fn min_latency_us(&self) -> u64 {
        let min = self.latency_min_us.load(Ordering::Relaxed);
        if min == u64::MAX {
            0
        } else {
            min
        }
    }

    /// Get max latency in microseconds
    pub fn max_latency_us(&self) -> u64 {
        self.latency_max_us.load(Ordering::Relaxed)
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Operations: {} (failed {}) [embed={} insert={} search={} score={}] | Latency (µs): avg={:.1}, min={}, max={}",
            self.total_ops(),
            self.failed_ops(),
            self.ops(Operation::Embed),
            self.ops(Operation::Insert),
            self.ops(Operation::Search),
            self.ops(Operation::Score),
            self.avg_latency_us(),
            self.min_latency_us(),
            self.max_latency_us()
        )
    }
}
