//! Structured error envelopes for failed tool calls.

use chrono::Utc;
use replicate_mcp_types::ErrorKind;
use rmcp::model::ErrorData;
use serde_json::{Value, json};

use crate::errors::DispatchError;

fn build_error_data(kind: ErrorKind, message: &str, context: Value, suggested_action: &str) -> Value {
    json!({
        "error_code": kind.as_str(),
        "category": category(kind),
        "message": message,
        "context": context,
        "retryable": kind.is_retryable(),
        "suggested_action": suggested_action,
        "correlation_id": format!("tool-{}", Utc::now().timestamp_millis()),
    })
}

fn category(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnknownTool | ErrorKind::InvalidArguments => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Unconfigured | ErrorKind::Unauthorized => "authentication",
        ErrorKind::RemoteUnavailable | ErrorKind::RemoteError => "execution",
    }
}

fn suggested_action(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnknownTool => "Call tools/list and use one of the advertised tool names.",
        ErrorKind::InvalidArguments => "Fix the named field to match the tool's input schema and retry.",
        ErrorKind::NotFound => "Check the identifier; list_models and search_models show what exists.",
        ErrorKind::Unconfigured => "Set REPLICATE_API_TOKEN for the server process and restart it.",
        ErrorKind::Unauthorized => "Check that the API token is valid and has access to this resource.",
        ErrorKind::RemoteUnavailable => "The Replicate API could not be reached; retry later.",
        ErrorKind::RemoteError => "The Replicate API rejected the request; retry or adjust the arguments.",
    }
}

/// Maps a dispatch failure onto the protocol's error envelope.
///
/// The `data` payload carries the stable error kind plus the offending
/// field or identifier when one is known.
pub fn to_error_data(tool: &str, error: &DispatchError) -> ErrorData {
    let kind = error.kind();
    let message = error.to_string();
    let mut context = json!({ "tool": tool });
    if let Some(field) = error.field() {
        context["field"] = Value::String(field.to_string());
    }
    if let Some(id) = error.resource_id() {
        context["id"] = Value::String(id.to_string());
    }
    let data = Some(build_error_data(kind, &message, context, suggested_action(kind)));

    match kind {
        ErrorKind::UnknownTool | ErrorKind::InvalidArguments => ErrorData::invalid_params(message, data),
        ErrorKind::NotFound => ErrorData::resource_not_found(message, data),
        ErrorKind::Unconfigured | ErrorKind::Unauthorized => ErrorData::invalid_request(message, data),
        ErrorKind::RemoteUnavailable | ErrorKind::RemoteError => ErrorData::internal_error(message, data),
    }
}

/// Error returned when the host cancels a call before it finishes.
pub fn cancelled_error(tool: &str) -> ErrorData {
    ErrorData::internal_error(format!("tool call '{tool}' was cancelled"), Some(json!({ "tool": tool, "cancelled": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicate_mcp_api::ApiError;
    use rmcp::model::ErrorCode;

    #[test]
    fn invalid_arguments_map_to_invalid_params_with_field() {
        let error = DispatchError::invalid_arguments("model", "is required");
        let data = to_error_data("predict", &error);
        assert_eq!(data.code, ErrorCode::INVALID_PARAMS);
        let payload = data.data.expect("payload");
        assert_eq!(payload["error_code"], json!("invalid_arguments"));
        assert_eq!(payload["context"]["field"], json!("model"));
        assert_eq!(payload["retryable"], json!(false));
    }

    #[test]
    fn not_found_carries_the_identifier() {
        let error = DispatchError::from(ApiError::not_found("version", "badver"));
        let data = to_error_data("predict", &error);
        assert_eq!(data.code, ErrorCode::RESOURCE_NOT_FOUND);
        let payload = data.data.expect("payload");
        assert_eq!(payload["context"]["id"], json!("badver"));
        assert_eq!(payload["category"], json!("not_found"));
    }

    #[test]
    fn remote_failures_are_retryable_internal_errors() {
        let error = DispatchError::from(ApiError::RemoteError {
            operation: "get_collection",
            status: Some(500),
            message: "boom".into(),
        });
        let data = to_error_data("get_collection", &error);
        assert_eq!(data.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(data.data.expect("payload")["retryable"], json!(true));
    }

    #[test]
    fn unconfigured_is_an_invalid_request() {
        let data = to_error_data("list_hardware", &DispatchError::from(ApiError::Unconfigured));
        assert_eq!(data.code, ErrorCode::INVALID_REQUEST);
        assert_eq!(data.data.expect("payload")["error_code"], json!("unconfigured"));
    }
}
