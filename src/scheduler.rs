use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::pipeline::OddsPipeline;

/// Result of one pass over every target URL.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub rows_saved: usize,
}

/// Background task that runs the pipeline for each configured page on a fixed interval.
/// Pages are processed one after another; a failing page never stops the sweep.
pub struct OddsScheduler {
    pipeline: Arc<OddsPipeline>,
    target_urls: Vec<String>,
    interval: Duration,
}

impl OddsScheduler {
    pub fn new(pipeline: Arc<OddsPipeline>, target_urls: Vec<String>, interval: Duration) -> Self {
        Self { pipeline, target_urls, interval }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }

    pub async fn run_once(&self) -> SweepSummary {
        info!(targets = self.target_urls.len(), "Scheduled sweep started");
        let mut summary = SweepSummary::default();

        for url in &self.target_urls {
            match self.pipeline.run(url).await {
                Ok(report) => {
                    summary.succeeded += 1;
                    summary.rows_saved += report.saved;
                    info!(url = %report.url, saved = report.saved, alerts = report.alerts.len(), "Sweep target done");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(url = %url, "Sweep target failed: {e}");
                }
            }
        }

        info!(
            targets = self.target_urls.len(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Scheduled sweep complete",
        );
        summary
    }
}
