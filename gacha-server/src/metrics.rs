//! Service Metrics - pull/save counters with a JSON snapshot
//!
//! Uses lock-free atomics for all counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared metrics state (all lock-free atomics)
#[derive(Debug)]
pub struct ServiceMetrics {
    /// Committed pull batches
    pub pulls: AtomicU64,
    /// Entities generated across all batches, overflow included
    pub entities_generated: AtomicU64,
    /// Batches that ran out of inventory room
    pub partial_storage: AtomicU64,
    /// Requests refused by validation or charge
    pub rejected: AtomicU64,
    pub saves: AtomicU64,
    pub save_failures: AtomicU64,
    /// Remote changes applied from the account feed
    pub remote_resyncs: AtomicU64,
    pub start_time: Instant,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self {
            pulls: AtomicU64::new(0),
            entities_generated: AtomicU64::new(0),
            partial_storage: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            remote_resyncs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl ServiceMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_pull(&self, entities: usize, partial: bool) {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        self.entities_generated
            .fetch_add(entities as u64, Ordering::Relaxed);
        if partial {
            self.partial_storage.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self, ok: bool) {
        if ok {
            self.saves.fetch_add(1, Ordering::Relaxed);
        } else {
            self.save_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_resync(&self) {
        self.remote_resyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pulls: self.pulls.load(Ordering::Relaxed),
            entities_generated: self.entities_generated.load(Ordering::Relaxed),
            partial_storage: self.partial_storage.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            remote_resyncs: self.remote_resyncs.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub pulls: u64,
    pub entities_generated: u64,
    pub partial_storage: u64,
    pub rejected: u64,
    pub saves: u64,
    pub save_failures: u64,
    pub remote_resyncs: u64,
    pub uptime_secs: f64,
}
