use thiserror::Error;

/// Everything that can go wrong between the line feed and an export.
#[derive(Debug, Error)]
pub enum OddsError {
    /// Connection failure or timeout talking to the upstream feed
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Upstream answered with something other than 200 OK
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// Top-level payload shape is not what the parser expects
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unsupported export format: {0:?}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl OddsError {
    /// True for failures caused by the upstream feed rather than by us
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            OddsError::Network(_) | OddsError::Upstream { .. } | OddsError::MalformedPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OddsError>;
