//! Shared health state for the /health endpoint.
//! Updated by the pipeline after every page run, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Default)]
pub struct HealthState {
    /// Nanosecond timestamp of the last run that persisted rows (0 = none).
    last_success_at_ns: AtomicU64,
    runs_total: AtomicU64,
    runs_failed: AtomicU64,
    rows_saved: AtomicU64,
    alerts_raised: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub last_success_at_ns: Option<u64>,
    pub runs_total: u64,
    pub runs_failed: u64,
    pub rows_saved: u64,
    pub alerts_raised: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, at_ns: u64, rows: usize, alerts: usize) {
        self.runs_total.fetch_add(1, Ordering::Relaxed);
        self.rows_saved.fetch_add(rows as u64, Ordering::Relaxed);
        self.alerts_raised.fetch_add(alerts as u64, Ordering::Relaxed);
        self.last_success_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.runs_total.fetch_add(1, Ordering::Relaxed);
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last = self.last_success_at_ns.load(Ordering::Relaxed);
        HealthSnapshot {
            last_success_at_ns: (last > 0).then_some(last),
            runs_total: self.runs_total.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            rows_saved: self.rows_saved.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
        }
    }
}
