use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::detection::{RANK_GAP_THRESHOLD, SUPPORT_RATE_THRESHOLD, TOP_FAVORITES_EXCLUDED};
use crate::detector::ranking::{rank_map, sorted_by, support_rate};
use crate::state::OddsBaseline;
use crate::types::{AlertRecord, AlertType, IdentityKey, OddsRecord};

/// Flags notable odds moves between successive observations of a race.
///
/// Two rules, both skipping the three lowest-odds favorites:
/// - support-rate surge: `1/current - 1/previous >= 0.02`
/// - rank divergence: `win_rank - place_rank >= 3`
///
/// Shared between the scheduler and the HTTP API: whole `detect` passes run one
/// at a time, and `latest_alerts` may be read from anywhere.
pub struct AnomalyDetector {
    baseline: OddsBaseline,
    /// Held for a full read-decide-write pass over the baseline.
    detect_lock: Mutex<()>,
    /// Result of the most recent `detect`, replaced wholesale each call.
    latest_alerts: RwLock<Vec<AlertRecord>>,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self {
            baseline: OddsBaseline::new(),
            detect_lock: Mutex::new(()),
            latest_alerts: RwLock::new(Vec::new()),
        }
    }

    pub fn detect(&self, records: &[OddsRecord]) -> Vec<AlertRecord> {
        let _pass = self.detect_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let valid: Vec<&OddsRecord> = records
            .iter()
            .filter(|r| r.win_odds.is_some_and(|o| o > Decimal::ZERO))
            .collect();

        if valid.is_empty() {
            debug!(records = records.len(), "[ANOMALY] no posted win odds, baseline untouched");
            self.replace_latest(Vec::new());
            return Vec::new();
        }

        let by_win = sorted_by(&valid, |r| r.win_odds);
        let favorites: HashSet<IdentityKey> = by_win
            .iter()
            .take(TOP_FAVORITES_EXCLUDED)
            .map(|(r, _)| r.identity_key())
            .collect();
        let win_ranks = rank_map(&by_win);

        // Both rules read the previous call's baseline; it is only written afterwards.
        let mut alerts = self.support_rate_surges(&valid, &favorites);
        alerts.extend(self.rank_divergences(&valid, &favorites, &win_ranks));

        for r in &valid {
            if let Some(odds) = r.win_odds {
                self.baseline.record(r.identity_key(), odds);
            }
        }

        debug!(
            valid = valid.len(),
            alerts = alerts.len(),
            tracked = self.baseline.len(),
            "[ANOMALY] detection pass complete",
        );

        self.replace_latest(alerts.clone());
        alerts
    }

    /// Snapshot of the most recent `detect` result. Empty before the first call.
    pub fn latest_alerts(&self) -> Vec<AlertRecord> {
        self.latest_alerts
            .read()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }

    /// Number of competitors with a stored baseline.
    pub fn tracked_count(&self) -> usize {
        self.baseline.len()
    }

    fn replace_latest(&self, alerts: Vec<AlertRecord>) {
        if let Ok(mut latest) = self.latest_alerts.write() {
            *latest = alerts;
        }
    }

    fn support_rate_surges(
        &self,
        valid: &[&OddsRecord],
        favorites: &HashSet<IdentityKey>,
    ) -> Vec<AlertRecord> {
        let mut alerts = Vec::new();

        for current in valid {
            let key = current.identity_key();
            if favorites.contains(&key) {
                continue;
            }
            // First sighting has nothing to compare against.
            let Some(previous_odds) = self.baseline.previous(&key) else {
                debug!(key = key.as_str(), "[ANOMALY] no baseline yet");
                continue;
            };
            let Some(current_odds) = current.win_odds else {
                continue;
            };
            let (Some(current_rate), Some(previous_rate)) =
                (support_rate(current_odds), support_rate(previous_odds))
            else {
                continue;
            };

            let increase = current_rate - previous_rate;
            if increase >= SUPPORT_RATE_THRESHOLD {
                info!(
                    event = "SUPPORT_RATE_SURGE",
                    horse_number = %current.horse_number,
                    horse_name = %current.horse_name,
                    increase = %increase,
                    previous_odds = %previous_odds,
                    current_odds = %current_odds,
                    "[ANOMALY] support rate surge | #{} {} | +{} | odds {} -> {}",
                    current.horse_number, current.horse_name, increase, previous_odds, current_odds,
                );
                alerts.push(AlertRecord {
                    horse_number: current.horse_number.clone(),
                    horse_name: current.horse_name.clone(),
                    alert_type: AlertType::SupportRateSurge,
                    value: increase,
                });
            }
        }

        alerts
    }

    fn rank_divergences(
        &self,
        valid: &[&OddsRecord],
        favorites: &HashSet<IdentityKey>,
        win_ranks: &HashMap<IdentityKey, i64>,
    ) -> Vec<AlertRecord> {
        let place_ranks = rank_map(&sorted_by(valid, |r| r.place_odds_min()));
        let mut alerts = Vec::new();

        for record in valid {
            let key = record.identity_key();
            if favorites.contains(&key) {
                continue;
            }
            // No usable place odds means no place rank.
            let (Some(&win_rank), Some(&place_rank)) = (win_ranks.get(&key), place_ranks.get(&key))
            else {
                continue;
            };

            let gap = win_rank - place_rank;
            if gap >= RANK_GAP_THRESHOLD {
                info!(
                    event = "RANK_DIVERGENCE",
                    horse_number = %record.horse_number,
                    horse_name = %record.horse_name,
                    win_rank,
                    place_rank,
                    gap,
                    "[ANOMALY] rank divergence | #{} {} | win rank {} vs place rank {} | gap {}",
                    record.horse_number, record.horse_name, win_rank, place_rank, gap,
                );
                alerts.push(AlertRecord {
                    horse_number: record.horse_number.clone(),
                    horse_name: record.horse_name.clone(),
                    alert_type: AlertType::RankDivergence,
                    value: Decimal::from(gap),
                });
            }
        }

        alerts
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
