pub mod odds_baseline;

pub use odds_baseline::OddsBaseline;
