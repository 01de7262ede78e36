//! Error types for the dashboard data core

use thiserror::Error;

/// Broad class of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Endpoint unreachable or answered with a non-success status
    Transport,
    /// Response body was not in the expected shape
    Parse,
}

/// Errors that can occur when fetching market data
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),
}

impl FetchError {
    /// Classifies the failure as transport or parse
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::InvalidResponse(_) => FailureKind::Parse,
            FetchError::NetworkError(e) if e.is_decode() => FailureKind::Parse,
            _ => FailureKind::Transport,
        }
    }

    /// Maps a reqwest error, keeping timeouts distinguishable
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::NetworkError(err)
        }
    }

    /// Creates an InvalidResponse error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors surfaced by the dashboard controller
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A market data fetch failed; the caller may offer a retry
    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// Coin is in neither the snapshot nor the detail view
    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    /// Operation requires the detail view
    #[error("No coin is being viewed")]
    NotInDetailView,

    /// A collaborator could not be constructed
    #[error("Setup failed: {0}")]
    Setup(String),
}

impl DashboardError {
    /// True when a manual retry could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::FetchFailed(_))
    }
}

/// Errors from the insight backends
#[derive(Debug, Error)]
pub enum InsightError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not carry generated text where expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend has no usable credential
    #[error("Backend {0} is not configured")]
    NotConfigured(&'static str),

    /// Provider name not recognised
    #[error("Unknown insight provider: {0}")]
    UnknownProvider(String),
}

/// Errors reading or writing persisted preferences
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
