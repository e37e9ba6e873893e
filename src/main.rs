mod api;
mod config;
mod db;
mod detector;
mod error;
mod extractor;
mod fetcher;
mod pipeline;
mod scheduler;
mod state;
mod types;

#[cfg(test)]
mod testkit;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::RunTimings;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::OddsWriter;
use crate::detector::AnomalyDetector;
use crate::error::Result;
use crate::fetcher::HttpPageSource;
use crate::pipeline::OddsPipeline;
use crate::scheduler::OddsScheduler;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let options = sqlx::sqlite::SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.db_path))?
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Pipeline: fetch → extract → detect → persist ---
    let source = Arc::new(HttpPageSource::new(cfg.fetch_timeout_secs)?);
    let pipeline = Arc::new(OddsPipeline::new(
        source,
        Arc::new(AnomalyDetector::new()),
        OddsWriter::new(pool),
        Arc::new(HealthState::new()),
        Arc::new(RunTimings::new()),
    ));

    // --- Scheduler ---
    if cfg.target_urls.is_empty() {
        warn!("TARGET_URLS not set; scheduled sweeps are idle; use POST /api/odds/fetch. Example: TARGET_URLS=https://.../odds/1,https://.../odds/2");
    } else {
        info!(
            "Sweeping {} target(s) every {}s: {}",
            cfg.target_urls.len(),
            cfg.scrape_interval_secs,
            cfg.target_urls.join(", "),
        );
    }
    let scheduler = OddsScheduler::new(
        Arc::clone(&pipeline),
        cfg.target_urls.clone(),
        Duration::from_secs(cfg.scrape_interval_secs),
    );
    tokio::spawn(async move { scheduler.run().await });

    // --- HTTP API server ---
    let app = router(ApiState { pipeline });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
