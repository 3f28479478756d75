use crate::error::{OddsError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://1xbetbd.com";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_SPORT_ID: u32 = 66; // Cricket
pub const DEFAULT_COUNT: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream_base_url: String,
    pub upstream_lang: String,
    pub default_sport_id: u32,
    pub default_count: u32,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: DEFAULT_BASE_URL.to_string(),
            upstream_lang: DEFAULT_LANG.to_string(),
            default_sport_id: DEFAULT_SPORT_ID,
            default_count: DEFAULT_COUNT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read every setting from the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; missing keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            upstream_base_url: lookup("UPSTREAM_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_base_url),
            upstream_lang: lookup("UPSTREAM_LANG").unwrap_or(defaults.upstream_lang),
            default_sport_id: parse_var(&lookup, "DEFAULT_SPORT_ID")?
                .unwrap_or(defaults.default_sport_id),
            default_count: parse_var(&lookup, "DEFAULT_COUNT")?.unwrap_or(defaults.default_count),
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| OddsError::Config(format!("{} is not a valid number: {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.default_sport_id, 66);
        assert_eq!(config.default_count, 100);
        assert_eq!(config.upstream_base_url, "https://1xbetbd.com");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("UPSTREAM_BASE_URL", "http://localhost:9999/"),
            ("DEFAULT_SPORT_ID", "1"),
            ("DEFAULT_COUNT", " 25 "),
            ("DATA_DIR", "/tmp/odds"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_base_url, "http://localhost:9999");
        assert_eq!(config.default_sport_id, 1);
        assert_eq!(config.default_count, 25);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/odds"));
    }

    #[test]
    fn test_bad_number_names_the_variable() {
        let err = AppConfig::from_lookup(lookup_from(&[("DEFAULT_COUNT", "lots")])).unwrap_err();
        assert!(err.to_string().contains("DEFAULT_COUNT"));
    }
}
