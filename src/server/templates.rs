use super::AppState;
use crate::models::MatchRecord;
use crate::utils::analysis::{sport_ids, MatchFilter};
use crate::utils::export::odds_labels;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

// Custom filters for formatting
mod filters {
    use chrono::{DateTime, Utc};

    pub fn format_price(price: &Option<f64>) -> ::askama::Result<String> {
        Ok(price.map(|p| format!("{:.2}", p)).unwrap_or_default())
    }

    pub fn kickoff(start: &Option<DateTime<Utc>>) -> ::askama::Result<String> {
        Ok(start
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "TBD".to_string()))
    }
}

pub struct MatchRow {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub sport_id: u32,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub is_live: bool,
    pub prices: Vec<Option<f64>>, // Aligned with the template's odds labels
}

impl MatchRow {
    fn new(record: &MatchRecord, labels: &[String]) -> Self {
        Self {
            id: record.id.clone().unwrap_or_default(),
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            league: record.league.clone(),
            sport_id: record.sport_id,
            start_time: record.start_time,
            is_live: record.is_live,
            prices: labels.iter().map(|l| record.odds.get(l).copied()).collect(),
        }
    }
}

pub struct SportOption {
    pub id: u32,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub has_data: bool,
    pub total_matches: usize,
    pub source: String,
    pub sport_filter: String,
    pub sport_options: Vec<SportOption>,
    pub odds_labels: Vec<String>,
    pub rows: Vec<MatchRow>,
    pub default_sport_id: u32,
    pub default_count: u32,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    // Kept as a string so the "all sports" option (empty value) is accepted
    pub sport: Option<String>,
}

/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    let sport = params
        .sport
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok());

    let dataset = state.dataset().await;
    let records: &[MatchRecord] = dataset
        .as_ref()
        .map(|d| d.records.as_slice())
        .unwrap_or_default();

    let filter = MatchFilter::by_sport(sport);
    let shown: Vec<MatchRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    let labels = odds_labels(&shown);

    let template = DashboardTemplate {
        has_data: dataset.is_some(),
        total_matches: records.len(),
        source: dataset.as_ref().map(|d| d.source.clone()).unwrap_or_default(),
        sport_filter: sport.map(|s| s.to_string()).unwrap_or_default(),
        sport_options: sport_ids(records)
            .into_iter()
            .map(|id| SportOption {
                id,
                selected: Some(id) == sport,
            })
            .collect(),
        rows: shown.iter().map(|r| MatchRow::new(r, &labels)).collect(),
        odds_labels: labels,
        default_sport_id: state.config.default_sport_id,
        default_count: state.config.default_count,
    };

    HtmlTemplate(template).into_response()
}
