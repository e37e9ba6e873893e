use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::api::latency::RunTimings;
use crate::db::OddsWriter;
use crate::detector::AnomalyDetector;
use crate::error::{AppError, Result};
use crate::extractor;
use crate::fetcher::PageSource;
use crate::types::{AlertRecord, SinkRow};

/// Outcome of one fetch → extract → detect → persist run.
#[derive(Debug)]
pub struct PipelineReport {
    pub url: String,
    pub saved: usize,
    pub alerts: Vec<AlertRecord>,
}

/// Runs one odds page end to end. Shared by the scheduler and the HTTP API.
pub struct OddsPipeline {
    source: Arc<dyn PageSource>,
    detector: Arc<AnomalyDetector>,
    writer: OddsWriter,
    health: Arc<HealthState>,
    timings: Arc<RunTimings>,
}

impl OddsPipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        detector: Arc<AnomalyDetector>,
        writer: OddsWriter,
        health: Arc<HealthState>,
        timings: Arc<RunTimings>,
    ) -> Self {
        Self { source, detector, writer, health, timings }
    }

    pub fn detector(&self) -> &Arc<AnomalyDetector> {
        &self.detector
    }

    pub fn writer(&self) -> &OddsWriter {
        &self.writer
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    pub fn timings(&self) -> &Arc<RunTimings> {
        &self.timings
    }

    /// Fetch, extract, detect and persist one page.
    ///
    /// A page that yields no rows fails with `AppError::NoOddsExtracted` and
    /// persists nothing; transport failures surface as `Http`/`Status`.
    pub async fn run(&self, url: &str) -> Result<PipelineReport> {
        let started = Instant::now();
        let result = self.run_inner(url).await;
        self.timings.record(started.elapsed());

        match &result {
            Ok(report) => self
                .health
                .record_success(now_ns() as u64, report.saved, report.alerts.len()),
            Err(_) => self.health.record_failure(),
        }
        result
    }

    async fn run_inner(&self, url: &str) -> Result<PipelineReport> {
        info!(url, "Fetching odds page");
        let html = self.source.fetch_html(url).await?;

        let records = extractor::extract(&html);
        if records.is_empty() {
            warn!(url, "No odds rows extracted");
            return Err(AppError::NoOddsExtracted(url.to_string()));
        }

        // Each alert is logged by the detector as it is raised.
        let alerts = self.detector.detect(&records);
        info!(
            url,
            records = records.len(),
            alerts = alerts.len(),
            tracked = self.detector.tracked_count(),
            "Detection done",
        );

        let observed_at = now_ns();
        let rows: Vec<SinkRow> = records.iter().map(|r| r.to_sink_row(observed_at)).collect();
        let saved = self.writer.append(&rows).await?;
        info!(url, saved, "Saved odds rows");

        Ok(PipelineReport {
            url: url.to_string(),
            saved,
            alerts,
        })
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

#[cfg(test)]
pub(crate) fn test_pipeline(source: crate::testkit::StaticPages, pool: sqlx::SqlitePool) -> (OddsPipeline, Arc<crate::testkit::StaticPages>) {
    let source = Arc::new(source);
    let pipeline = OddsPipeline::new(
        source.clone(),
        Arc::new(AnomalyDetector::new()),
        OddsWriter::new(pool),
        Arc::new(HealthState::new()),
        Arc::new(RunTimings::new()),
    );
    (pipeline, source)
}
