use replicate_mcp_types::ErrorKind;
use replicate_mcp_util::{redact_sensitive, status_error_message};
use thiserror::Error;

/// Failure of a single adapter operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Replicate API token is not configured; set REPLICATE_API_TOKEN")]
    Unconfigured,

    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error("{message}")]
    Unauthorized { status: u16, message: String },

    #[error("Replicate API unreachable during {operation}: {message}")]
    RemoteUnavailable { operation: &'static str, message: String },

    #[error("Replicate API error during {operation}{}: {message}", status_suffix(.status))]
    RemoteError {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unconfigured => ErrorKind::Unconfigured,
            ApiError::InvalidArgument { .. } => ErrorKind::InvalidArguments,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            ApiError::RemoteError { .. } => ErrorKind::RemoteError,
        }
    }

    /// The argument that was rejected, when the failure is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Identifier of the missing resource for `NotFound`.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Classifies a non-2xx response.
    ///
    /// 404 becomes `NotFound` for `target` (or the request path), 401/403
    /// become `Unauthorized`, everything else is `RemoteError`.
    pub(crate) fn from_status(operation: &'static str, status: u16, detail: String, target: Option<&Target>, path: &str) -> Self {
        match status {
            404 => match target {
                Some(target) => ApiError::not_found(target.resource, target.id.clone()),
                None => ApiError::not_found("resource", path),
            },
            401 | 403 => ApiError::Unauthorized {
                status,
                message: match status_error_message(status) {
                    Some(hint) => format!("{hint}: {detail}"),
                    None => detail,
                },
            },
            _ => ApiError::RemoteError {
                operation,
                status: Some(status),
                message: detail,
            },
        }
    }

    /// Classifies a transport-level failure from reqwest.
    pub(crate) fn from_transport(operation: &'static str, error: &reqwest::Error) -> Self {
        let message = redact_sensitive(&error.to_string());
        if error.is_decode() {
            return ApiError::RemoteError {
                operation,
                status: error.status().map(|status| status.as_u16()),
                message,
            };
        }
        let message = if error.is_timeout() {
            format!("request timed out: {message}")
        } else if error.is_connect() {
            format!("connection failed: {message}")
        } else {
            message
        };
        ApiError::RemoteUnavailable { operation, message }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (status {code})")).unwrap_or_default()
}

/// The resource a request addresses, used to phrase `NotFound`.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub resource: &'static str,
    pub id: String,
}

impl Target {
    pub fn new(resource: &'static str, id: impl Into<String>) -> Self {
        Self { resource, id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_the_literal_identifier() {
        let target = Target::new("model", "owner/missing");
        let error = ApiError::from_status("get_model_versions", 404, "gone".into(), Some(&target), "/models/owner/missing/versions");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource_id(), Some("owner/missing"));
        assert_eq!(error.to_string(), "model 'owner/missing' not found");
    }

    #[test]
    fn status_classification_is_distinct() {
        let unauthorized = ApiError::from_status("list_models", 401, "Invalid token".into(), None, "/models");
        assert_eq!(unauthorized.kind(), ErrorKind::Unauthorized);
        assert!(unauthorized.to_string().contains("REPLICATE_API_TOKEN"));

        let forbidden = ApiError::from_status("list_models", 403, "nope".into(), None, "/models");
        assert_eq!(forbidden.kind(), ErrorKind::Unauthorized);

        let server = ApiError::from_status("get_collection", 500, "boom".into(), None, "/collections/x");
        assert_eq!(server.kind(), ErrorKind::RemoteError);
        assert_eq!(server.to_string(), "Replicate API error during get_collection (status 500): boom");

        let unprocessable = ApiError::from_status("create_prediction", 422, "bad input".into(), None, "/predictions");
        assert_eq!(unprocessable.kind(), ErrorKind::RemoteError);
    }

    #[test]
    fn untargeted_not_found_uses_the_path() {
        let error = ApiError::from_status("list_hardware", 404, String::new(), None, "/hardware");
        assert_eq!(error.resource_id(), Some("/hardware"));
    }

    #[test]
    fn invalid_argument_exposes_field() {
        let error = ApiError::invalid_argument("limit", "must be between 1 and 100");
        assert_eq!(error.kind(), ErrorKind::InvalidArguments);
        assert_eq!(error.field(), Some("limit"));
    }
}
