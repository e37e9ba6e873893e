use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::types::IdentityKey;

// ---------------------------------------------------------------------------
// OddsBaseline
// ---------------------------------------------------------------------------

/// Last observed win odds per competitor, the detector's only memory between calls.
///
/// Entries are overwritten on every observation and never removed. Individual
/// reads and writes are safe from any thread; a read-decide-write sequence is
/// not atomic, so `AnomalyDetector` runs whole passes under its own lock.
#[derive(Debug, Default)]
pub struct OddsBaseline {
    /// identity key → previous win odds
    previous_win_odds: DashMap<IdentityKey, Decimal>,
}

impl OddsBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous win odds, if a positive baseline exists for this competitor.
    pub fn previous(&self, key: &IdentityKey) -> Option<Decimal> {
        let odds = *self.previous_win_odds.get(key)?;
        (odds > Decimal::ZERO).then_some(odds)
    }

    pub fn record(&self, key: IdentityKey, win_odds: Decimal) {
        self.previous_win_odds.insert(key, win_odds);
    }

    pub fn len(&self) -> usize {
        self.previous_win_odds.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
