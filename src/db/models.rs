/// Row type of the `odds_rows` table, one per persisted `SinkRow`.
/// Absent odds are stored as empty strings, matching the sink's column contract.

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OddsRow {
    pub id: i64,
    pub observed_at: i64,
    pub race_name: String,
    pub horse_number: String,
    pub horse_name: String,
    pub win_odds: String,
    pub place_odds_min: String,
    pub place_odds_max: String,
}
