use replicate_mcp_api::ApiError;
use replicate_mcp_registry::TemplateError;
use replicate_mcp_types::ErrorKind;
use replicate_mcp_util::SchemaViolation;
use thiserror::Error;

/// Terminal failure of one tool call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("invalid arguments: field '{field}' {reason}")]
    InvalidArguments { field: String, reason: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to encode the result of '{tool}': {message}")]
    Encoding { tool: &'static str, message: String },
}

impl DispatchError {
    pub fn invalid_arguments(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DispatchError::InvalidArguments {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::UnknownTool { .. } => ErrorKind::UnknownTool,
            DispatchError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            DispatchError::Api(error) => error.kind(),
            DispatchError::Encoding { .. } => ErrorKind::RemoteError,
        }
    }

    /// The offending argument, when the failure is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            DispatchError::InvalidArguments { field, .. } => Some(field),
            DispatchError::Api(error) => error.field(),
            DispatchError::UnknownTool { .. } | DispatchError::Encoding { .. } => None,
        }
    }

    /// The identifier that did not resolve, for `NotFound`.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            DispatchError::Api(error) => error.resource_id(),
            _ => None,
        }
    }
}

impl From<SchemaViolation> for DispatchError {
    fn from(violation: SchemaViolation) -> Self {
        DispatchError::InvalidArguments {
            reason: violation.constraint.to_string(),
            field: violation.field,
        }
    }
}

/// Template problems surface against the caller's arguments.
///
/// An unknown template id is reported on the `template` argument; a rule
/// violation names the offending parameter inside `input`.
impl From<TemplateError> for DispatchError {
    fn from(error: TemplateError) -> Self {
        match error {
            TemplateError::NotFound { .. } => DispatchError::invalid_arguments("template", error.to_string()),
            TemplateError::Validation {
                template_id,
                field,
                constraint,
            } => DispatchError::InvalidArguments {
                reason: format!("{constraint} (template '{template_id}')"),
                field,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicate_mcp_util::Constraint;

    #[test]
    fn schema_violations_name_the_field() {
        let error = DispatchError::from(SchemaViolation::new("model", Constraint::Required));
        assert_eq!(error.kind(), ErrorKind::InvalidArguments);
        assert_eq!(error.field(), Some("model"));
        assert_eq!(error.to_string(), "invalid arguments: field 'model' is required");
    }

    #[test]
    fn unknown_templates_point_at_the_template_argument() {
        let error = DispatchError::from(TemplateError::NotFound {
            template_id: "sd/nope".into(),
            available: "sd/sdxl".into(),
        });
        assert_eq!(error.field(), Some("template"));
        assert!(error.to_string().contains("sd/nope"));
    }

    #[test]
    fn api_errors_keep_their_kind() {
        let error = DispatchError::from(ApiError::not_found("collection", "nope"));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource_id(), Some("nope"));
        assert_eq!(error.to_string(), "collection 'nope' not found");
    }
}
