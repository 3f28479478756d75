use crate::error::{OddsError, Result};
use crate::models::MatchRecord;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Fixed CSV columns, before the per-label odds columns
const BASE_COLUMNS: [&str; 23] = [
    "id",
    "home_team",
    "away_team",
    "league",
    "sport_id",
    "sport_name",
    "country",
    "start_time",
    "is_live",
    "venue",
    "stage",
    "home_team_id",
    "away_team_id",
    "event_count",
    "prob_home",
    "prob_draw",
    "prob_away",
    "temperature",
    "weather_condition",
    "humidity",
    "wind_speed",
    "pressure",
    "precipitation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = OddsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(OddsError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialize records in the requested format
pub fn export(records: &[MatchRecord], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(records),
    }
}

/// Same as [`export`], for callers holding the format as a string
pub fn export_as(records: &[MatchRecord], format: &str) -> Result<Vec<u8>> {
    export(records, format.parse()?)
}

/// Every odds label seen across the batch, sorted
pub fn odds_labels(records: &[MatchRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.odds.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn to_json(records: &[MatchRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

fn to_csv(records: &[MatchRecord]) -> Result<Vec<u8>> {
    let labels = odds_labels(records);
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(labels.iter().map(|label| format!("odds_{}", label)));
    writer.write_record(header)?;

    for record in records {
        let probabilities = record.win_probabilities.clone().unwrap_or_default();
        let weather = record.weather.clone().unwrap_or_default();
        let mut row = vec![
            record.id.clone().unwrap_or_default(),
            record.home_team.clone(),
            record.away_team.clone(),
            record.league.clone(),
            record.sport_id.to_string(),
            record.sport_name.clone().unwrap_or_default(),
            record.country.clone().unwrap_or_default(),
            record
                .start_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            record.is_live.to_string(),
            record.venue.clone().unwrap_or_default(),
            record.stage.clone().unwrap_or_default(),
            optional(record.home_team_id),
            optional(record.away_team_id),
            optional(record.event_count),
            optional(probabilities.home_win),
            optional(probabilities.draw),
            optional(probabilities.away_win),
            weather.temperature.unwrap_or_default(),
            weather.condition.unwrap_or_default(),
            weather.humidity.unwrap_or_default(),
            weather.wind_speed.unwrap_or_default(),
            weather.pressure.unwrap_or_default(),
            weather.precipitation.unwrap_or_default(),
        ];
        // Missing labels stay blank so every row has every column
        row.extend(labels.iter().map(|label| {
            record
                .odds
                .get(label)
                .map(|price| price.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| OddsError::Io(e.into_error()))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
