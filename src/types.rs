use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Odds records
// ---------------------------------------------------------------------------

/// Place odds range as posted on the page. Both bounds are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOdds {
    pub min: Decimal,
    pub max: Decimal,
}

/// One competitor row extracted from an odds page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsRecord {
    /// Empty when the page carries no recoverable race title.
    pub race_name: String,
    /// Opaque competitor identifier; kept as text to tolerate non-numeric markup.
    pub horse_number: String,
    pub horse_name: String,
    /// None = not yet posted or unparsable.
    pub win_odds: Option<Decimal>,
    pub place_odds: Option<PlaceOdds>,
}

impl OddsRecord {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.race_name, &self.horse_number)
    }

    pub fn place_odds_min(&self) -> Option<Decimal> {
        self.place_odds.map(|p| p.min)
    }

    pub fn place_odds_max(&self) -> Option<Decimal> {
        self.place_odds.map(|p| p.max)
    }

    /// Flatten into the sink's column layout. Absent odds become empty strings.
    pub fn to_sink_row(&self, observed_at_ns: i64) -> SinkRow {
        SinkRow {
            observed_at_ns,
            race_name: self.race_name.clone(),
            horse_number: self.horse_number.clone(),
            horse_name: self.horse_name.clone(),
            win_odds: decimal_or_empty(self.win_odds),
            place_odds_min: decimal_or_empty(self.place_odds_min()),
            place_odds_max: decimal_or_empty(self.place_odds_max()),
        }
    }
}

fn decimal_or_empty(v: Option<Decimal>) -> String {
    v.map(|d| d.to_string()).unwrap_or_default()
}

/// Correlates observations of the same competitor across detector calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(race_name: &str, horse_number: &str) -> Self {
        Self(format!("{race_name}:{horse_number}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Sink rows
// ---------------------------------------------------------------------------

/// Flat row handed to the sink, columns in persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkRow {
    /// Nanosecond UTC epoch, assigned by the caller once per page.
    pub observed_at_ns: i64,
    pub race_name: String,
    pub horse_number: String,
    pub horse_name: String,
    pub win_odds: String,
    pub place_odds_min: String,
    pub place_odds_max: String,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Support rate (1 / win odds) rose by at least the surge threshold since the last observation.
    SupportRateSurge,
    /// Win rank trails place rank by at least the gap threshold.
    RankDivergence,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertType::SupportRateSurge => "SUPPORT_RATE_SURGE",
            AlertType::RankDivergence => "RANK_DIVERGENCE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub horse_number: String,
    pub horse_name: String,
    pub alert_type: AlertType,
    /// Support-rate increase for a surge, rank gap for a divergence.
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(win: Option<Decimal>, place: Option<PlaceOdds>) -> OddsRecord {
        OddsRecord {
            race_name: "Nakayama Kinen".to_string(),
            horse_number: "7".to_string(),
            horse_name: "Kitasan".to_string(),
            win_odds: win,
            place_odds: place,
        }
    }

    #[test]
    fn identity_key_joins_race_and_number() {
        let r = record(None, None);
        assert_eq!(r.identity_key().as_str(), "Nakayama Kinen:7");
        assert_eq!(r.identity_key(), IdentityKey::new("Nakayama Kinen", "7"));
    }

    #[test]
    fn sink_row_keeps_posted_odds_text() {
        let r = record(Some(dec!(2.5)), Some(PlaceOdds { min: dec!(1.2), max: dec!(1.5) }));
        let row = r.to_sink_row(42);
        assert_eq!(row.observed_at_ns, 42);
        assert_eq!(row.horse_number, "7");
        assert_eq!(row.win_odds, "2.5");
        assert_eq!(row.place_odds_min, "1.2");
        assert_eq!(row.place_odds_max, "1.5");
    }

    #[test]
    fn sink_row_uses_empty_marker_for_missing_odds() {
        let row = record(None, None).to_sink_row(0);
        assert_eq!(row.win_odds, "");
        assert_eq!(row.place_odds_min, "");
        assert_eq!(row.place_odds_max, "");
    }

    #[test]
    fn alert_type_serializes_screaming_case() {
        let json = serde_json::to_string(&AlertType::SupportRateSurge).unwrap();
        assert_eq!(json, "\"SUPPORT_RATE_SURGE\"");
        assert_eq!(AlertType::RankDivergence.to_string(), "RANK_DIVERGENCE");
    }
}
