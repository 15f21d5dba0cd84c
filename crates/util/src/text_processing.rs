//! # Text Processing Utilities
//!
//! Redaction of credentials before text reaches logs or error payloads.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const REDACTED: &str = "[REDACTED]";

/// Object keys whose values are always masked by [`redact_json`].
const SENSITIVE_KEYS: &[&str] = &["api_token", "authorization", "key", "password", "secret", "token"];

/// Every pattern captures a preserved prefix in group 1 and the secret in group 2.
static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"()(\br8_[A-Za-z0-9]{8,})",
        r"()(\bwhsec_[A-Za-z0-9+/=]{8,})",
        r"(?i)(authorization:\s*(?:bearer\s+|token\s+|basic\s+)?)([^\s,]+)",
        r"(?i)(\bbearer\s+)([A-Za-z0-9\-._~+/]+=*)",
        r"(?i)(\b[A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
        r#"(?i)("(?:api_token|token|secret|password|authorization)"\s*:\s*")([^"]+)"#,
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Key names and header prefixes are preserved so the output stays useful
/// for debugging.
///
/// ```rust
/// use replicate_mcp_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("REPLICATE_API_TOKEN=r8_abcdefghijkl"), "REPLICATE_API_TOKEN=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer abc123"), "Authorization: Bearer [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, REDACTED)
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    REDACT_PATTERNS.iter().fold(input.to_string(), |text, pattern| {
        pattern
            .replace_all(&text, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{replacement}")
            })
            .into_owned()
    })
}

/// Returns a copy of `value` with sensitive keys masked and string leaves redacted.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let masked = if SENSITIVE_KEYS.iter().any(|candidate| key.eq_ignore_ascii_case(candidate)) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_json(inner)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::String(text) => Value::String(redact_sensitive(text)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_replicate_tokens_anywhere() {
        let line = "request failed for token r8_0123456789abcdefXYZ while listing";
        let redacted = redact_sensitive(line);
        assert!(!redacted.contains("r8_0123456789"));
        assert!(redacted.contains("[REDACTED]"));
    }

    #[test]
    fn keeps_prefixes_for_headers_and_env_pairs() {
        assert_eq!(redact_sensitive("authorization: token abc"), "authorization: token [REDACTED]");
        assert_eq!(redact_sensitive("MY_SECRET=hunter2 other"), "MY_SECRET=[REDACTED] other");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let text = "model stability-ai/sdxl has 3 versions";
        assert_eq!(redact_sensitive(text), text);
    }

    #[test]
    fn custom_replacement_token() {
        assert_eq!(redact_sensitive_with("Bearer abc.def", "***"), "Bearer ***");
    }

    #[test]
    fn masks_sensitive_json_keys_recursively() {
        let value = json!({
            "model": "o/n",
            "key": "whsec_abcdefghij",
            "input": { "prompt": "hi", "api_token": "x" },
            "notes": ["Bearer xyz"]
        });
        let redacted = redact_json(&value);
        assert_eq!(redacted["model"], json!("o/n"));
        assert_eq!(redacted["key"], json!("[REDACTED]"));
        assert_eq!(redacted["input"]["api_token"], json!("[REDACTED]"));
        assert_eq!(redacted["input"]["prompt"], json!("hi"));
        assert_eq!(redacted["notes"][0], json!("Bearer [REDACTED]"));
    }
}
