use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized match with whatever odds the line feed offered for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub league: String, // Empty when upstream has no league name
    pub sport_id: u32,
    pub sport_name: Option<String>,
    pub country: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub is_live: bool,
    pub venue: Option<String>,
    pub stage: Option<String>,
    pub home_team_id: Option<u64>,
    pub away_team_id: Option<u64>,
    pub event_count: Option<u32>, // Number of betting events upstream lists for the match
    pub win_probabilities: Option<WinProbabilities>,
    pub weather: Option<Weather>,
    pub odds: BTreeMap<String, f64>, // Outcome label -> decimal price
}

/// Upstream's own win probabilities for the match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinProbabilities {
    pub home_win: Option<f64>,
    pub draw: Option<f64>,
    pub away_win: Option<f64>,
}

/// Venue weather as reported upstream; values are kept as the feed's text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: Option<String>,
    pub condition: Option<String>,
    pub humidity: Option<String>,
    pub wind_speed: Option<String>,
    pub pressure: Option<String>,
    pub precipitation: Option<String>,
}

impl MatchRecord {
    pub fn name(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// The record set currently backing the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<MatchRecord>,
    pub source: String, // Artifact path or sample file it came from
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(records: Vec<MatchRecord>, source: impl Into<String>) -> Self {
        Self {
            records,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }
}

/// Response body of a successful fetch-parse-save cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub success: bool,
    pub matches_fetched: usize,
    pub saved_to: String,
    pub timestamp: String,
}

/// Response body of a failed fetch or any other API error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub success: bool,
    pub error: String,
}

impl FetchFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// League with the number of matches it has in a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueCount {
    pub league: String,
    pub count: usize,
}

/// Aggregate view served by `/api/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_matches: usize,
    pub live_matches: usize,
    pub matches_by_sport: BTreeMap<u32, usize>,
    pub popular_leagues: Vec<LeagueCount>,
    pub source: String,
}
