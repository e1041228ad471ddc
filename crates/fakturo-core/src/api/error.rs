use serde::Deserialize;
use thiserror::Error;

/// Error body shape the backend uses for every failure response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status. Displays as the
    /// backend's message alone so UI pages can surface it directly.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// No HTTP response was obtained (connectivity, DNS, TLS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response carried a body this client could not decode.
    #[error("Invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// An operation that needs a stored session was attempted without one.
    #[error("No active session")]
    MissingSession,
}

impl ApiError {
    /// Classify a non-success response. The message comes from the body's
    /// `error` field; absent or malformed bodies degrade to `HTTP <status>`.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|parsed| parsed.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// The HTTP status code, when a response was obtained at all. Callers
    /// must treat `None` as a non-authentication failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this failure invalidates the current session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Status { status: 401 | 403, .. } | ApiError::MissingSession
        )
    }
}
