use replicate_mcp_util::ParameterSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{RegistryError, TemplateError};

/// Default parameters and validation rules for one model family variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Namespaced identifier, e.g. `controlnet/canny`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    pub version: String,
    pub default_parameters: Map<String, Value>,
    pub parameter_schema: ParameterSchema,
}

impl Template {
    /// Builds a template from its JSON definition, assigning the `<family>/<variant>` id.
    pub(crate) fn define(family: &str, variant: &str, mut definition: Value) -> Result<Self, RegistryError> {
        let id = format!("{family}/{variant}");
        if let Some(object) = definition.as_object_mut() {
            object.insert("id".to_string(), Value::String(id.clone()));
        }
        serde_json::from_value(definition).map_err(|source| RegistryError::InvalidDefinition { id, source })
    }

    /// Overlays `parameters` on the defaults. Explicit non-null values win.
    pub fn merge_defaults(&self, parameters: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.default_parameters.clone();
        for (field, value) in parameters {
            if !value.is_null() {
                merged.insert(field.clone(), value.clone());
            }
        }
        merged
    }

    /// Merges defaults and checks the result against the parameter rules.
    ///
    /// Integral floats in integer fields come back as integers.
    pub fn validate(&self, parameters: &Map<String, Value>) -> Result<Map<String, Value>, TemplateError> {
        let mut merged = self.merge_defaults(parameters);
        self.parameter_schema
            .validate(&merged)
            .map_err(|violation| TemplateError::Validation {
                template_id: self.id.clone(),
                field: violation.field,
                constraint: violation.constraint,
            })?;
        self.parameter_schema.normalize_integers(&mut merged);
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upscaler() -> Template {
        Template::define(
            "test",
            "upscale",
            json!({
                "name": "Upscaler",
                "description": "x",
                "model_type": "image",
                "version": "0.1.0",
                "default_parameters": { "scale": 2 },
                "parameter_schema": {
                    "type": "object",
                    "properties": {
                        "image": { "type": "string" },
                        "scale": { "type": "integer", "enum": [2, 4] }
                    },
                    "required": ["image"],
                    "additionalProperties": false
                }
            }),
        )
        .expect("definition parses")
    }

    #[test]
    fn define_assigns_namespaced_id() {
        assert_eq!(upscaler().id, "test/upscale");
    }

    #[test]
    fn null_parameters_keep_defaults() {
        let template = upscaler();
        let parameters = json!({ "image": "data:", "scale": null });
        let merged = template.validate(parameters.as_object().expect("object")).expect("valid");
        assert_eq!(merged["scale"], json!(2));
    }

    #[test]
    fn closed_template_rejects_unknown_fields() {
        let template = upscaler();
        let parameters = json!({ "image": "data:", "face_enhance": true });
        let error = template
            .validate(parameters.as_object().expect("object"))
            .expect_err("unknown field");
        assert_eq!(error.field(), Some("face_enhance"));
    }

    #[test]
    fn malformed_definition_is_reported_with_id() {
        let error = Template::define("test", "broken", json!({ "name": "no schema" })).expect_err("invalid");
        assert!(matches!(error, RegistryError::InvalidDefinition { ref id, .. } if id == "test/broken"));
    }
}
