use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable classification of every failure the server can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No usable API token was supplied.
    Unconfigured,
    UnknownTool,
    /// Arguments or template parameters broke a declared rule.
    InvalidArguments,
    NotFound,
    /// The service rejected the token.
    Unauthorized,
    /// Network failure or timeout before a response arrived.
    RemoteUnavailable,
    /// The service answered with a non-404 failure or an unreadable body.
    RemoteError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unconfigured => "unconfigured",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::RemoteError => "remote_error",
        }
    }

    /// Whether the same call could succeed if simply repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RemoteUnavailable | ErrorKind::RemoteError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
