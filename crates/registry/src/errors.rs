use replicate_mcp_util::Constraint;
use thiserror::Error;

/// Failures raised while resolving or validating against a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template '{template_id}' not found; available templates: {available}")]
    NotFound { template_id: String, available: String },

    #[error("template '{template_id}' rejected parameters: field '{field}' {constraint}")]
    Validation {
        template_id: String,
        field: String,
        constraint: Constraint,
    },
}

impl TemplateError {
    /// The parameter that broke a rule, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            TemplateError::NotFound { .. } => None,
            TemplateError::Validation { field, .. } => Some(field),
        }
    }
}

/// Startup-time configuration errors while assembling the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate template id '{id}'")]
    DuplicateTemplate { id: String },

    #[error("template '{id}' has an invalid definition: {source}")]
    InvalidDefinition {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
