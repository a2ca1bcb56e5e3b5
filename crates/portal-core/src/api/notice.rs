use std::fmt;
use tracing::warn;

/// A dismissible, user-facing message raised when a request fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The session was cleared; the user has to log in again.
    SessionExpired,
    Forbidden,
    NotFound,
    Validation(String),
    ServerError,
    Network,
    RequestFailed(String),
}

impl Notice {
    /// Whether the front end should send the user to the login entry point.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => f.write_str("Session expired, please login again"),
            Self::Forbidden => f.write_str("You do not have permission to perform this action"),
            Self::NotFound => f.write_str("Resource not found"),
            Self::Validation(detail) | Self::RequestFailed(detail) => f.write_str(detail),
            Self::ServerError => f.write_str("Server error, please try again later"),
            Self::Network => f.write_str("Network error, please check your connection"),
        }
    }
}

/// Receiver for notices raised by the central error interception.
pub trait NoticeSink: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

impl<F> NoticeSink for F
where
    F: Fn(Notice) + Send + Sync + 'static,
{
    fn notify(&self, notice: Notice) {
        self(notice);
    }
}

/// Logs notices; the default when no front end is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, notice: Notice) {
        warn!(target: "portal::notice", requires_login = notice.requires_login(), "{notice}");
    }
}
