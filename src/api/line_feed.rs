use crate::config::AppConfig;
use crate::error::{OddsError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const LINE_FEED_PATH: &str = "/LineFeed/Get1x2_VZip";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Fixed feed parameters: time frame, timezone, mode, country, grouping
const FEED_PARAMS: [(&str, &str); 6] = [
    ("tf", "2200000"),
    ("tz", "6"),
    ("mode", "4"),
    ("country", "19"),
    ("getEmpty", "true"),
    ("gr", "925"),
];

/// Client for the public pre-match line feed
pub struct LineFeedClient {
    base_url: String,
    lang: String,
    client: Client,
}

impl LineFeedClient {
    pub fn new(base_url: impl Into<String>, lang: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(OddsError::Network)?;

        Ok(Self {
            base_url: base_url.into(),
            lang: lang.into(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.upstream_base_url.clone(),
            config.upstream_lang.clone(),
            config.request_timeout,
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, LINE_FEED_PATH)
    }

    /// Fetch up to `count` matches for `sport_id`.
    /// One attempt only: any failure goes straight back to the caller.
    pub async fn fetch_matches(&self, sport_id: u32, count: u32) -> Result<Value> {
        let url = self.endpoint();
        info!(sport_id, count, %url, "fetching line feed");

        let sport = sport_id.to_string();
        let count = count.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("sports", sport.as_str()),
                ("count", count.as_str()),
                ("lng", self.lang.as_str()),
            ])
            .query(&FEED_PARAMS)
            .send()
            .await
            .map_err(OddsError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OddsError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(OddsError::Network)?;
        debug!(bytes = body.len(), "line feed responded");

        serde_json::from_slice(&body).map_err(|e| {
            OddsError::MalformedPayload(format!("response body is not valid JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client =
            LineFeedClient::new("http://localhost:1234", "en", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/LineFeed/Get1x2_VZip"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nothing is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = LineFeedClient::new(
            format!("http://127.0.0.1:{}", port),
            "en",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.fetch_matches(66, 10).await.unwrap_err();
        assert!(matches!(err, OddsError::Network(_)));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_live_feed() {
        dotenv::dotenv().ok();
        let config = AppConfig::from_env().unwrap();
        let client = LineFeedClient::from_config(&config).unwrap();

        let payload = client.fetch_matches(1, 10).await.unwrap();
        assert!(payload.get("Value").is_some());
    }
}
