use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Everything a request can fail with, from URL parsing to the final relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limited by upstream after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("Failed to fetch {what}: {reason}")]
    FetchFailed { what: String, reason: String },

    #[error("No embedded player configuration found in {0} page")]
    ConfigNotFound(String),

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Requested format not available: {0}")]
    FormatNotAvailable(String),

    #[error("Upstream stream returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            RelayError::VideoUnavailable(_) | RelayError::FormatNotAvailable(_) => {
                StatusCode::NOT_FOUND
            }
            RelayError::FetchFailed { .. }
            | RelayError::ConfigNotFound(_)
            | RelayError::UpstreamStatus(_)
            | RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn fetch_failed(what: impl Into<String>, reason: impl ToString) -> Self {
        RelayError::FetchFailed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// JSON body sent to the client for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: status.as_u16(),
            timestamp: crate::server::now_ms(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed ({}): {}", status.as_u16(), self);
        } else {
            tracing::warn!("request rejected ({}): {}", status.as_u16(), self);
        }

        (status, Json(ErrorBody::new(status, self.to_string()))).into_response()
    }
}
