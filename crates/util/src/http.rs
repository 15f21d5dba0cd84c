//! # HTTP Utilities
//!
//! Helpers for turning remote responses into readable diagnostics and for
//! following cursor-paginated listings.

use serde_json::Value;
use url::Url;

use crate::text_processing::redact_sensitive;

const PREVIEW_LIMIT: usize = 200;

/// Friendly hint for authentication-related status codes.
///
/// ```rust
/// use replicate_mcp_util::status_error_message;
///
/// assert!(status_error_message(401).unwrap().contains("REPLICATE_API_TOKEN"));
/// assert!(status_error_message(404).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: set REPLICATE_API_TOKEN to a valid API token".into()),
        403 => Some("Forbidden (403). Hint: the token lacks access to this resource".into()),
        429 => Some("Too Many Requests (429). The service is rate limiting this token".into()),
        _ => None,
    }
}

/// Extracts the human-readable detail from an error response body.
///
/// The service answers errors with problem documents carrying `detail` or
/// `title`; anything else falls back to a truncated, redacted preview.
pub fn error_detail(body: &str) -> String {
    if let Ok(Value::Object(document)) = serde_json::from_str::<Value>(body) {
        for field in ["detail", "title", "error", "message"] {
            if let Some(text) = document.get(field).and_then(Value::as_str)
                && !text.trim().is_empty()
            {
                return redact_sensitive(text.trim());
            }
        }
    }
    redact_sensitive(&truncate_preview(body, PREVIEW_LIMIT))
}

/// Collapses whitespace and truncates `text` to roughly `limit` bytes.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.trim().chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }
    preview
}

/// Pulls the `cursor` query parameter out of a pagination URL.
///
/// ```rust
/// use replicate_mcp_util::cursor_from_url;
///
/// let next = "https://api.replicate.com/v1/models?cursor=cD0yMDIz";
/// assert_eq!(cursor_from_url(next).as_deref(), Some("cD0yMDIz"));
/// assert_eq!(cursor_from_url("not a url"), None);
/// ```
pub fn cursor_from_url(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    parsed
        .query_pairs()
        .find(|(name, _)| name == "cursor")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_for_auth_statuses() {
        assert!(status_error_message(403).is_some_and(|text| text.contains("Forbidden")));
        assert!(status_error_message(500).is_none());
    }

    #[test]
    fn prefers_problem_document_detail() {
        let body = r#"{"title":"Not found","detail":"The requested resource could not be found.","status":404}"#;
        assert_eq!(error_detail(body), "The requested resource could not be found.");
        assert_eq!(error_detail(r#"{"title":"Invalid version"}"#), "Invalid version");
    }

    #[test]
    fn falls_back_to_redacted_preview() {
        let body = format!("upstream exploded\nAuthorization: Bearer r8_secretsecret {}", "x".repeat(400));
        let detail = error_detail(&body);
        assert!(detail.starts_with("upstream exploded Authorization:"));
        assert!(!detail.contains("r8_secretsecret"));
        assert!(detail.ends_with("..."));
        assert_eq!(error_detail("   "), "<empty>");
    }

    #[test]
    fn cursor_extraction_handles_missing_and_encoded_values() {
        assert_eq!(
            cursor_from_url("https://api.replicate.com/v1/models?cursor=abc%3D%3D&x=1").as_deref(),
            Some("abc==")
        );
        assert_eq!(cursor_from_url("https://api.replicate.com/v1/models"), None);
        assert_eq!(cursor_from_url("https://api.replicate.com/v1/models?cursor="), None);
    }
}
