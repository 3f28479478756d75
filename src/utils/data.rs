use crate::error::Result;
use crate::models::MatchRecord;
use chrono::Utc;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ARTIFACT_PREFIX: &str = "matches_";
pub const SAMPLE_DATA_FILE: &str = "sample_data.json";

/// Write records to a new timestamped JSON artifact in `data_dir`.
/// Never overwrites: a name collision gets a numeric suffix.
pub fn save_artifact(records: &[MatchRecord], data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let json = serde_json::to_vec_pretty(records)?;
    let stem = format!("{}{}", ARTIFACT_PREFIX, Utc::now().format("%Y%m%d_%H%M%S_%9f"));

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.json", stem)
        } else {
            format!("{}_{}.json", stem, attempt)
        };
        let path = data_dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&json)?;
                info!(path = %path.display(), records = records.len(), "saved artifact");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Load a previously saved artifact
pub fn load_artifact(path: &Path) -> Result<Vec<MatchRecord>> {
    let json = fs::read(path)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Newest artifact in `data_dir`, judged by its timestamped name
pub fn latest_artifact(data_dir: &Path) -> Result<Option<PathBuf>> {
    if !data_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !name.starts_with(ARTIFACT_PREFIX) || !name.ends_with(".json") {
            continue;
        }
        if latest.as_ref().map_or(true, |(best, _)| name > *best) {
            latest = Some((name, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Create the data directory and an empty sample payload if they are missing.
/// Returns the sample file path.
pub fn ensure_data_dir(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let sample_path = data_dir.join(SAMPLE_DATA_FILE);

    if !sample_path.exists() {
        let sample = serde_json::json!({
            "Error": "",
            "ErrorCode": 0,
            "Success": true,
            "Value": []
        });
        fs::write(&sample_path, serde_json::to_vec_pretty(&sample)?)?;
        info!(path = %sample_path.display(), "created sample data file");
    }

    Ok(sample_path)
}

/// Read a raw upstream payload saved to disk
pub fn load_raw_payload(path: &Path) -> Result<Value> {
    let json = fs::read(path)?;
    Ok(serde_json::from_slice(&json)?)
}
