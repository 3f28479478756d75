use crate::models::{DataSummary, Dataset, LeagueCount, MatchRecord};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_MATCH_LIMIT: usize = 100;

/// Filters accepted by `/api/matches`
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub sport_id: Option<u32>,
    pub live_only: bool,
    pub min_odds: Option<f64>,
    pub limit: Option<usize>,
}

impl MatchFilter {
    pub fn by_sport(sport_id: Option<u32>) -> Self {
        Self {
            sport_id,
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &MatchRecord) -> bool {
        if let Some(sport_id) = self.sport_id {
            if record.sport_id != sport_id {
                return false;
            }
        }
        if self.live_only && !record.is_live {
            return false;
        }
        if let Some(min_odds) = self.min_odds {
            // At least one outcome priced at or above the threshold
            if !record.odds.values().any(|price| *price >= min_odds) {
                return false;
            }
        }
        true
    }

    /// Matching records in upstream order, capped at the limit
    pub fn apply<'a>(&self, records: &'a [MatchRecord]) -> Vec<&'a MatchRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .take(self.limit.unwrap_or(DEFAULT_MATCH_LIMIT))
            .collect()
    }
}

/// Leagues by match count, most frequent first; ties broken by name
pub fn popular_leagues(records: &[MatchRecord]) -> Vec<LeagueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.league.as_str()).or_insert(0) += 1;
    }

    let mut leagues: Vec<LeagueCount> = counts
        .into_iter()
        .map(|(league, count)| LeagueCount {
            league: league.to_string(),
            count,
        })
        .collect();
    leagues.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.league.cmp(&b.league)));
    leagues
}

pub fn live_matches(records: &[MatchRecord]) -> Vec<&MatchRecord> {
    records.iter().filter(|r| r.is_live).collect()
}

pub fn find_match<'a>(records: &'a [MatchRecord], id: &str) -> Option<&'a MatchRecord> {
    records.iter().find(|r| r.id.as_deref() == Some(id))
}

/// Distinct sport ids present, ascending
pub fn sport_ids(records: &[MatchRecord]) -> Vec<u32> {
    let mut ids: Vec<u32> = records.iter().map(|r| r.sport_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub fn summarize(dataset: &Dataset) -> DataSummary {
    let mut matches_by_sport = BTreeMap::new();
    for record in &dataset.records {
        *matches_by_sport.entry(record.sport_id).or_insert(0) += 1;
    }

    DataSummary {
        total_matches: dataset.records.len(),
        live_matches: live_matches(&dataset.records).len(),
        matches_by_sport,
        popular_leagues: popular_leagues(&dataset.records),
        source: dataset.source.clone(),
    }
}
