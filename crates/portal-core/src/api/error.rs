use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use super::notice::Notice;

const FALLBACK_DETAIL: &str = "An error occurred";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {detail}")]
    Unauthorized { detail: String },

    #[error("Permission denied: {detail}")]
    Forbidden { detail: String },

    #[error("Not found: {detail}")]
    NotFound { detail: String },

    #[error("Validation failed: {detail}")]
    Validation { detail: String },

    #[error("Server error (Status: {status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Unexpected response (Status: {status}): {detail}")]
    Unexpected { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse response from {endpoint}: {details}")]
    Decode { endpoint: String, details: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = error_detail(body);
        match status.as_u16() {
            401 => Self::Unauthorized { detail },
            403 => Self::Forbidden { detail },
            404 => Self::NotFound { detail },
            422 => Self::Validation { detail },
            code @ 500..=599 => Self::Server {
                status: code,
                detail,
            },
            code => Self::Unexpected {
                status: code,
                detail,
            },
        }
    }

    /// HTTP status behind this error, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Validation { .. } => Some(422),
            Self::Server { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// User-facing notice for transport-level failures. Client-side
    /// failures (bad input, cancellation) produce none.
    ///
    /// `Unauthorized` maps to a plain error notice here; the session-expiry
    /// notice is raised separately by the client when a live session is
    /// actually cleared.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Unauthorized { detail } => Some(Notice::RequestFailed(detail.clone())),
            Self::Forbidden { .. } => Some(Notice::Forbidden),
            Self::NotFound { .. } => Some(Notice::NotFound),
            Self::Validation { detail } => Some(Notice::Validation(detail.clone())),
            Self::Server { status: 500, .. } => Some(Notice::ServerError),
            Self::Server { detail, .. } | Self::Unexpected { detail, .. } => {
                Some(Notice::RequestFailed(detail.clone()))
            }
            Self::Network(_) => Some(Notice::Network),
            Self::Decode { .. } => Some(Notice::RequestFailed("Request failed".to_string())),
            Self::InvalidInput(_) | Self::Configuration(_) | Self::Cancelled => None,
        }
    }
}

/// Pull a human-readable message out of an error body: `detail` (a string,
/// or the first validation item's `msg`), then `message`, then a fallback.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return FALLBACK_DETAIL.to_string();
    };

    let from_detail = match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    from_detail
        .or_else(|| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_DETAIL.to_string())
}
