pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod server;
pub mod utils;

pub use api::*;
pub use config::AppConfig;
pub use error::{OddsError, Result};
pub use models::*;
pub use utils::*;

use chrono::Utc;
use parser::parse_matches;
use std::path::Path;
use tracing::info;
use utils::data::save_artifact;

/// One fetch-parse-save cycle: pull the line feed, normalize it and write
/// the records to a fresh artifact. Returns the records with a summary.
pub async fn fetch_live_matches(
    client: &LineFeedClient,
    sport_id: u32,
    count: u32,
    data_dir: &Path,
) -> Result<(Vec<MatchRecord>, FetchSummary)> {
    let payload = client.fetch_matches(sport_id, count).await?;
    let records = parse_matches(&payload, sport_id)?;
    let saved_to = save_artifact(&records, data_dir)?;

    let summary = FetchSummary {
        success: true,
        matches_fetched: records.len(),
        saved_to: saved_to.display().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    info!(
        sport_id,
        matches = summary.matches_fetched,
        saved_to = %summary.saved_to,
        "fetch cycle complete"
    );

    Ok((records, summary))
}
