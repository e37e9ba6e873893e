use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::detection::SUPPORT_RATE_SCALE;
use crate::types::{IdentityKey, OddsRecord};

/// Records with a positive value under `key`, sorted ascending by it.
/// The sort is stable: equal odds keep their input order.
pub fn sorted_by<'a, F>(records: &[&'a OddsRecord], key: F) -> Vec<(&'a OddsRecord, Decimal)>
where
    F: Fn(&OddsRecord) -> Option<Decimal>,
{
    let mut ranked: Vec<(&'a OddsRecord, Decimal)> = records
        .iter()
        .filter_map(|&r| key(r).filter(|v| *v > Decimal::ZERO).map(|v| (r, v)))
        .collect();
    ranked.sort_by(|a, b| a.1.cmp(&b.1));
    ranked
}

/// 1-based rank per identity key. A key seen twice keeps its later position.
pub fn rank_map(sorted: &[(&OddsRecord, Decimal)]) -> HashMap<IdentityKey, i64> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, (r, _))| (r.identity_key(), i as i64 + 1))
        .collect()
}

/// Market-implied win probability `1 / odds`, rounded half-up to a fixed scale.
pub fn support_rate(win_odds: Decimal) -> Option<Decimal> {
    Decimal::ONE
        .checked_div(win_odds)
        .map(|r| r.round_dp_with_strategy(SUPPORT_RATE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}
