use super::AppState;
use crate::error::OddsError;
use crate::fetch_live_matches;
use crate::models::{DataSummary, Dataset, FetchFailure, FetchSummary, LeagueCount, MatchRecord};
use crate::utils::analysis::{find_match, popular_leagues, summarize, MatchFilter};
use crate::utils::export::{export, ExportFormat};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Errors surfaced to API callers as `{success: false, error}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NoData,
    NotFound(String),
    Odds(OddsError),
}

impl From<OddsError> for ApiError {
    fn from(err: OddsError) -> Self {
        ApiError::Odds(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NoData => (StatusCode::NOT_FOUND, "No data available".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, what),
            ApiError::Odds(err) => {
                match &err {
                    OddsError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                    e if e.is_upstream_failure() => (
                        StatusCode::BAD_GATEWAY,
                        format!("Error fetching data: {}", err),
                    ),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                }
            }
        };
        (status, Json(FetchFailure::new(message))).into_response()
    }
}

async fn current_dataset(state: &AppState) -> Result<Arc<Dataset>, ApiError> {
    state.dataset().await.ok_or(ApiError::NoData)
}

/// Parse an optional query value; blank counts as absent
fn query_value<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid value for {}: {:?}", name, value))),
    }
}

// Query values are taken as text so bad input gets a JSON error body
#[derive(Debug, Deserialize)]
pub struct FetchParams {
    pub sports: Option<String>,
    pub count: Option<String>,
}

/// POST /api/fetch-live
pub async fn fetch_live(
    State(state): State<AppState>,
    query: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<FetchSummary>, ApiError> {
    let Query(params) = query?;
    let sport_id = query_value("sports", params.sports.as_deref())?
        .unwrap_or(state.config.default_sport_id);
    let count = query_value("count", params.count.as_deref())?
        .unwrap_or(state.config.default_count);

    match fetch_live_matches(&state.client, sport_id, count, &state.config.data_dir).await {
        Ok((records, summary)) => {
            state
                .replace_dataset(Dataset::new(records, summary.saved_to.clone()))
                .await;
            Ok(Json(summary))
        }
        Err(e) => {
            warn!(sport_id, count, error = %e, "live fetch failed");
            Err(e.into())
        }
    }
}

/// GET /api/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<DataSummary>, ApiError> {
    let dataset = current_dataset(&state).await?;
    Ok(Json(summarize(&dataset)))
}

#[derive(Debug, Deserialize)]
pub struct MatchParams {
    pub sport_id: Option<String>,
    pub live_only: Option<String>,
    pub min_odds: Option<String>,
    pub limit: Option<String>,
}

impl TryFrom<MatchParams> for MatchFilter {
    type Error = ApiError;

    fn try_from(params: MatchParams) -> Result<Self, ApiError> {
        Ok(MatchFilter {
            sport_id: query_value("sport_id", params.sport_id.as_deref())?,
            live_only: query_value("live_only", params.live_only.as_deref())?.unwrap_or(false),
            min_odds: query_value("min_odds", params.min_odds.as_deref())?,
            limit: query_value("limit", params.limit.as_deref())?,
        })
    }
}

/// GET /api/matches
pub async fn matches(
    State(state): State<AppState>,
    query: Result<Query<MatchParams>, QueryRejection>,
) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    let Query(params) = query?;
    let filter = MatchFilter::try_from(params)?;
    let dataset = current_dataset(&state).await?;
    let records = filter.apply(&dataset.records).into_iter().cloned().collect();
    Ok(Json(records))
}

/// GET /api/match/:id
pub async fn match_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchRecord>, ApiError> {
    let dataset = current_dataset(&state).await?;
    find_match(&dataset.records, &id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))
}

/// GET /api/leagues
pub async fn leagues(State(state): State<AppState>) -> Result<Json<Vec<LeagueCount>>, ApiError> {
    let dataset = current_dataset(&state).await?;
    Ok(Json(popular_leagues(&dataset.records)))
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    // The dashboard sends an empty value when no sport filter is active
    pub sport_id: Option<String>,
}

/// GET /api/export/:format
pub async fn export_dataset(
    State(state): State<AppState>,
    Path(format): Path<String>,
    query: Result<Query<ExportParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let format: ExportFormat = format.parse()?;
    let filter = MatchFilter::by_sport(query_value("sport_id", params.sport_id.as_deref())?);
    let dataset = current_dataset(&state).await?;

    let records: Vec<MatchRecord> = dataset
        .records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    let body = export(&records, format)?;

    let filename = format!(
        "matches_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
