use crate::error::{AppError, Result};

/// Scheduler sweep interval (seconds).
pub const SCRAPE_INTERVAL_SECS: u64 = 300;

/// Per-request timeout for page fetches (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Sent with every page fetch; the odds site rejects obvious bot agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Default page size for `/api/odds/recent`.
pub const RECENT_ROWS_DEFAULT_LIMIT: i64 = 100;

/// Anomaly detection thresholds. Both comparisons are inclusive.
pub mod detection {
    use rust_decimal::Decimal;

    /// Minimum support-rate increase (0.02 = two percentage points).
    pub const SUPPORT_RATE_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

    /// Fractional digits kept when computing `1 / odds`.
    pub const SUPPORT_RATE_SCALE: u32 = 10;

    /// Minimum `win_rank - place_rank` for a divergence alert.
    pub const RANK_GAP_THRESHOLD: i64 = 3;

    /// Lowest-odds competitors never alerted on.
    pub const TOP_FAVORITES_EXCLUDED: usize = 3;
}

/// Selection grammar of the odds pages.
pub mod selectors {
    pub const RACE_TITLE: &str = "h2.hr-predictRaceInfo__title";
    pub const PAGE_TITLE: &str = "title";
    pub const ROW: &str = "tr.hr-tableValue__row";
    pub const NUMBER_CELL: &str = "td.hr-tableValue__data--number";
    pub const BRACKET_MARKER: &str = ".hr-icon__bracketNum";
    pub const HORSE_CELL: &str = "td.hr-tableValue__data--horse";
    pub const LINK: &str = "a";
    pub const ODDS_CELL: &str = "td.hr-tableValue__data--odds";

    /// `<title>` reads `競馬 - {race} オッズ - スポーツナビ`.
    pub const TITLE_PREFIX: &str = "競馬 - ";
    pub const TITLE_SUFFIX: &str = " オッズ";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Pages swept by the scheduler (TARGET_URLS, comma-separated).
    pub target_urls: Vec<String>,
    pub scrape_interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "odds.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            target_urls: parse_url_list(&std::env::var("TARGET_URLS").unwrap_or_default()),
            scrape_interval_secs: parse_secs("SCRAPE_INTERVAL_SECS", SCRAPE_INTERVAL_SECS)?,
            fetch_timeout_secs: parse_secs("FETCH_TIMEOUT_SECS", FETCH_TIMEOUT_SECS)?,
        })
    }
}

fn parse_secs(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(AppError::Config(format!(
                "{var} must be a positive number of seconds, got {raw:?}"
            ))),
            Ok(n) => Ok(n),
        },
        Err(_) => Ok(default),
    }
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
