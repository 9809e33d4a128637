use std::time::Duration;
use thiserror::Error;

/// Failure of a single archive lookup.
///
/// Every variant is considered transient: the retry layer absorbs them and
/// eventually reports "no data" instead of propagating.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    Network(String, #[source] reqwest::Error),

    #[error("Request for {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        reason: Option<String>,
    },

    #[error("Unexpected response body from {0}")]
    Protocol(String, #[source] serde_json::Error),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    /// Short machine-friendly name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(..) => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::HttpStatus { .. } => "http-status",
            FetchError::Protocol(..) => "protocol",
            FetchError::ClientBuild(..) => "client-build",
        }
    }
}
