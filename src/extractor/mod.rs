pub mod numbers;
pub mod odds_page;

pub use odds_page::extract;
