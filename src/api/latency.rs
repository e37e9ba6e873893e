//! In-memory histogram of pipeline run times (fetch through persist).

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Shared run-time stats. Pipeline records, API reads.
/// Values stored in milliseconds.
pub struct RunTimings {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RunPercentiles {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

impl RunTimings {
    /// Tracks 1ms to 10 minutes, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 600_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let ms = d.as_millis().clamp(1, 600_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(ms);
        }
    }

    pub fn percentiles(&self) -> RunPercentiles {
        let Ok(h) = self.inner.lock() else {
            return RunPercentiles { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None };
        };
        if h.len() == 0 {
            return RunPercentiles { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None };
        }
        RunPercentiles {
            samples: h.len(),
            p50_ms: Some(h.value_at_quantile(0.5)),
            p95_ms: Some(h.value_at_quantile(0.95)),
            p99_ms: Some(h.value_at_quantile(0.99)),
        }
    }
}

impl Default for RunTimings {
    fn default() -> Self {
        Self::new()
    }
}
