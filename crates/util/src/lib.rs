//! Shared helpers for the Replicate MCP workspace.
//!
//! - [`schema`]: the data-driven parameter rules interpreter used by tool
//!   inputs and model templates.
//! - [`text_processing`]: secret redaction for log and error output.
//! - [`http`]: status hints, error-body summaries, and cursor extraction.

pub mod http;
pub mod schema;
pub mod text_processing;

pub use http::{cursor_from_url, error_detail, status_error_message, truncate_preview};
pub use schema::{Constraint, ParameterSchema, PropertyRule, SchemaViolation, ValueKind};
pub use text_processing::{redact_json, redact_sensitive, redact_sensitive_with};
