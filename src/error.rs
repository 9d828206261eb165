use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankinError {
    #[error("invalid api version {0:?}: expected YYYY-MM-DD")]
    InvalidVersion(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("api rejected request: {0}")]
    Transport(#[from] TransportError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid or unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no next page")]
    NoNextPage,

    #[error("no previous page")]
    NoPreviousPage,

    #[error("invalid cursor {uri:?}: {reason}")]
    InvalidCursor { uri: String, reason: &'static str },
}

impl BankinError {
    /// HTTP status of a rejected request, if this error came from the API.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BankinError::Transport(err) => Some(err.status),
            BankinError::Network(err) => err.status(),
            _ => None,
        }
    }
}

/// Non-2xx response returned by the API, kept verbatim.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub status: StatusCode,
    pub body: String,
}

impl TransportError {
    /// Decode the `{ "type": ..., "message": ... }` envelope the API uses for errors.
    pub fn api_error(&self) -> Option<ApiError> {
        serde_json::from_str(&self.body).ok()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.api_error() {
            Some(api) => write!(f, "status {} ({}: {})", self.status, api.kind, api.message),
            None => write!(f, "status {}", self.status),
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}
