//! Tool call dispatch.
//!
//! One pass per call: look the tool up, validate the argument bundle against
//! its schema, decode typed arguments, invoke the adapter, and wrap the
//! result as a JSON object. Every check finishes before the adapter is
//! touched, so a rejected call never reaches the network.

use std::sync::Arc;

use replicate_mcp_api::{CreatePrediction, ReplicateApi};
use replicate_mcp_registry::{TemplateError, TemplateRegistry};
use replicate_mcp_types::{PredictionStatus, WebhookEvent};
use replicate_mcp_util::{ParameterSchema, redact_json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::errors::DispatchError;
use crate::tools::{Operation, ToolDescriptor, ToolRegistry};

/// Routes tool calls to the adapter and the template registry.
///
/// Holds only read-only state; concurrent calls share nothing mutable.
#[derive(Clone)]
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    templates: Arc<TemplateRegistry>,
    api: Arc<dyn ReplicateApi>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.tools.len())
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(tools: Arc<ToolRegistry>, templates: Arc<TemplateRegistry>, api: Arc<dyn ReplicateApi>) -> Self {
        Self { tools, templates, api }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Runs one tool call and returns its success content.
    pub async fn dispatch(&self, name: &str, arguments: Option<Map<String, Value>>) -> Result<Value, DispatchError> {
        let Some(descriptor) = self.tools.get(name) else {
            warn!(tool = %name, "unknown tool");
            return Err(DispatchError::UnknownTool { name: name.to_string() });
        };

        let outcome = match prepare_arguments(&descriptor.input_schema, arguments.unwrap_or_default()) {
            Ok(arguments) => self.invoke(descriptor, arguments).await,
            Err(error) => Err(error),
        };

        // Adapter failures were already logged in full where they were classified.
        match &outcome {
            Ok(_) => info!(tool = %name, "tool call succeeded"),
            Err(DispatchError::Api(error)) => info!(tool = %name, kind = %error.kind(), "tool call failed upstream"),
            Err(error) => warn!(tool = %name, kind = %error.kind(), error = %error, "tool call failed"),
        }
        outcome
    }

    async fn invoke(&self, descriptor: &ToolDescriptor, arguments: Map<String, Value>) -> Result<Value, DispatchError> {
        let tool = descriptor.name;
        debug!(tool = %tool, arguments = %redact_json(&serde_json::Value::Object(arguments.clone())), "invoking tool");
        match descriptor.operation {
            Operation::Predict => {
                let args: PredictArgs = decode(arguments)?;
                let input = match args.template.as_deref() {
                    Some(template_id) => self.templates.validate(template_id, &args.input)?,
                    None => args.input,
                };
                let request = CreatePrediction {
                    model: args.model,
                    input,
                    version: args.version,
                    wait: args.wait,
                    wait_timeout_seconds: args.wait_timeout_seconds,
                    stream: args.stream,
                    webhook: args.webhook,
                    webhook_events_filter: args.webhook_events_filter,
                };
                content(tool, self.api.create_prediction(request).await?)
            }
            Operation::ListModels => {
                let args: ListModelsArgs = decode(arguments)?;
                let page = self.api.list_models(args.owner.as_deref(), args.cursor.as_deref()).await?;
                content(tool, page)
            }
            Operation::GetModelVersions => {
                let args: ModelArgs = decode(arguments)?;
                let versions = self.api.get_model_versions(&args.model).await?;
                wrapped(tool, "versions", versions)
            }
            Operation::GetPredictionStatus => {
                let args: PredictionArgs = decode(arguments)?;
                content(tool, self.api.get_prediction_status(&args.prediction_id).await?)
            }
            Operation::CancelPrediction => {
                let args: PredictionArgs = decode(arguments)?;
                content(tool, self.api.cancel_prediction(&args.prediction_id).await?)
            }
            Operation::ListPredictions => {
                let args: ListPredictionsArgs = decode(arguments)?;
                let predictions = self.api.list_predictions(args.status, args.limit).await?;
                wrapped(tool, "predictions", predictions)
            }
            Operation::SearchModels => {
                let args: SearchArgs = decode(arguments)?;
                content(tool, self.api.search_models(&args.query, args.cursor.as_deref()).await?)
            }
            Operation::ListHardware => {
                let hardware = self.api.list_hardware().await?;
                wrapped(tool, "hardware", hardware)
            }
            Operation::ListCollections => {
                let collections = self.api.list_collections().await?;
                wrapped(tool, "collections", collections)
            }
            Operation::GetCollection => {
                let args: CollectionArgs = decode(arguments)?;
                content(tool, self.api.get_collection(&args.collection_slug).await?)
            }
            Operation::GetWebhookSecret => {
                let secret = self.api.get_webhook_secret().await?;
                Ok(json!({ "secret": secret.key }))
            }
            Operation::ListTemplates => {
                let templates: Vec<_> = self.templates.templates().collect();
                wrapped(tool, "templates", templates)
            }
            Operation::ValidateTemplate => {
                let args: ValidateTemplateArgs = decode(arguments)?;
                let parameters = args.parameters.unwrap_or_default();
                match self.templates.validate(&args.template, &parameters) {
                    Ok(merged) => Ok(json!({
                        "template": args.template,
                        "valid": true,
                        "parameters": merged,
                    })),
                    Err(TemplateError::Validation { field, constraint, .. }) => Ok(json!({
                        "template": args.template,
                        "valid": false,
                        "field": field,
                        "reason": constraint.to_string(),
                    })),
                    Err(error) => Err(error.into()),
                }
            }
        }
    }
}

/// Drops nulls, checks the schema, and normalizes integral floats.
fn prepare_arguments(schema: &ParameterSchema, mut arguments: Map<String, Value>) -> Result<Map<String, Value>, DispatchError> {
    arguments.retain(|_, value| !value.is_null());
    schema.validate(&arguments)?;
    schema.normalize_integers(&mut arguments);
    Ok(arguments)
}

fn decode<T: DeserializeOwned>(arguments: Map<String, Value>) -> Result<T, DispatchError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|error| DispatchError::invalid_arguments("arguments", error.to_string()))
}

/// Wraps list results so every success content is an object.
fn wrapped<T: Serialize>(tool: &'static str, key: &str, value: T) -> Result<Value, DispatchError> {
    let mut object = Map::new();
    object.insert(key.to_string(), content(tool, value)?);
    Ok(Value::Object(object))
}

fn content<T: Serialize>(tool: &'static str, value: T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|error| DispatchError::Encoding {
        tool,
        message: error.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct PredictArgs {
    model: String,
    input: Map<String, Value>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    wait: bool,
    #[serde(default)]
    wait_timeout_seconds: Option<i64>,
    #[serde(default)]
    stream: bool,
    #[serde(default)]
    webhook: Option<String>,
    #[serde(default)]
    webhook_events_filter: Option<Vec<WebhookEvent>>,
}

#[derive(Debug, Deserialize)]
struct ListModelsArgs {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelArgs {
    model: String,
}

#[derive(Debug, Deserialize)]
struct PredictionArgs {
    prediction_id: String,
}

#[derive(Debug, Deserialize)]
struct ListPredictionsArgs {
    #[serde(default)]
    status: Option<PredictionStatus>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionArgs {
    collection_slug: String,
}

#[derive(Debug, Deserialize)]
struct ValidateTemplateArgs {
    template: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicate_mcp_util::PropertyRule;

    fn schema() -> ParameterSchema {
        ParameterSchema::object()
            .required_property("model", PropertyRule::non_empty_string())
            .property("limit", PropertyRule::integer().range(1.0, 100.0))
            .closed()
    }

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn nulls_count_as_absent() {
        let prepared = prepare_arguments(&schema(), as_map(json!({ "model": "a/b", "limit": null }))).expect("valid");
        assert!(!prepared.contains_key("limit"));

        let error = prepare_arguments(&schema(), as_map(json!({ "model": null }))).expect_err("missing");
        assert_eq!(error.field(), Some("model"));
    }

    #[test]
    fn integral_floats_become_integers() {
        let prepared = prepare_arguments(&schema(), as_map(json!({ "model": "a/b", "limit": 20.0 }))).expect("valid");
        assert_eq!(prepared["limit"], json!(20));
        let args: ListPredictionsArgs = decode(prepared).expect("decodes");
        assert_eq!(args.limit, Some(20));
    }

    #[test]
    fn undeclared_fields_are_rejected() {
        let error = prepare_arguments(&schema(), as_map(json!({ "model": "a/b", "extra": 1 }))).expect_err("closed");
        assert_eq!(error.field(), Some("extra"));
    }
}
