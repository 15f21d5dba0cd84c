//! Tool descriptors and the tool registry.
//!
//! Each tool carries one [`ParameterSchema`]. The same value is rendered for
//! host introspection and enforced at call time, so what a host sees is
//! exactly what the dispatcher accepts.

use std::sync::Arc;

use indexmap::IndexMap;
use replicate_mcp_api::{PREDICTION_LIMIT_RANGE, WAIT_SECONDS_RANGE};
use replicate_mcp_types::{PredictionStatus, WebhookEvent};
use replicate_mcp_util::{ParameterSchema, PropertyRule};
use rmcp::model::{Tool, ToolAnnotations};
use thiserror::Error;

/// The operation a tool invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Predict,
    ListModels,
    GetModelVersions,
    GetPredictionStatus,
    CancelPrediction,
    ListPredictions,
    SearchModels,
    ListHardware,
    ListCollections,
    GetCollection,
    GetWebhookSecret,
    ListTemplates,
    ValidateTemplate,
}

/// A named, schema-described operation exposed to the host.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: ParameterSchema,
    /// The tool only reads remote or local state.
    pub read_only: bool,
    pub operation: Operation,
}

impl ToolDescriptor {
    /// Renders the descriptor for `tools/list`.
    pub fn to_rmcp_tool(&self) -> Tool {
        let mut tool = Tool::new(self.name, self.description, Arc::new(self.input_schema.to_json_schema()));
        tool.title = Some(self.title.to_string());
        let mut annotations = ToolAnnotations::with_title(self.title);
        annotations.read_only_hint = Some(self.read_only);
        annotations.destructive_hint = Some(false);
        annotations.open_world_hint = Some(!matches!(self.operation, Operation::ListTemplates | Operation::ValidateTemplate));
        tool.annotations = Some(annotations);
        tool
    }
}

#[derive(Debug, Error)]
#[error("duplicate tool name '{0}'")]
pub struct DuplicateTool(pub String);

/// Name-keyed tool registry, populated once at startup.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<&'static str, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Result<Self, DuplicateTool> {
        let mut tools = IndexMap::new();
        for descriptor in descriptors {
            if tools.contains_key(descriptor.name) {
                return Err(DuplicateTool(descriptor.name.to_string()));
            }
            tools.insert(descriptor.name, descriptor);
        }
        Ok(Self { tools })
    }

    /// Every built-in tool, in listing order.
    pub fn builtin() -> Self {
        let tools = builtin_descriptors()
            .into_iter()
            .map(|descriptor| (descriptor.name, descriptor))
            .collect();
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    pub fn to_rmcp_tools(&self) -> Vec<Tool> {
        self.descriptors().map(ToolDescriptor::to_rmcp_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn model_id() -> PropertyRule {
    PropertyRule::non_empty_string().describe("Model identifier in 'owner/name' format")
}

fn prediction_id() -> PropertyRule {
    PropertyRule::non_empty_string().describe("Prediction id")
}

fn cursor() -> PropertyRule {
    PropertyRule::string().describe("Pagination cursor from a previous page")
}

fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "predict",
            title: "Create prediction",
            description: "Run a model. Uses the model's latest version unless 'version' is given. \
                With 'template', the input is checked against and merged with that template's defaults first.",
            input_schema: ParameterSchema::object()
                .required_property("model", model_id())
                .required_property("input", PropertyRule::object().describe("Model input parameters"))
                .property("version", PropertyRule::non_empty_string().describe("Model version id"))
                .property("template", PropertyRule::non_empty_string().describe("Parameter template id, e.g. 'sd/sdxl'"))
                .property("wait", PropertyRule::boolean().describe("Hold the response until the prediction finishes"))
                .property(
                    "wait_timeout_seconds",
                    PropertyRule::integer()
                        .range(*WAIT_SECONDS_RANGE.start() as f64, *WAIT_SECONDS_RANGE.end() as f64)
                        .describe("Server-side wait bound in seconds"),
                )
                .property("stream", PropertyRule::boolean().describe("Request a live output stream URL"))
                .property("webhook", PropertyRule::non_empty_string().describe("HTTPS URL notified on prediction events"))
                .property(
                    "webhook_events_filter",
                    PropertyRule::array_of(PropertyRule::string().one_of(WebhookEvent::ALL.map(|event| event.as_str())))
                        .describe("Events that trigger the webhook"),
                )
                .closed(),
            read_only: false,
            operation: Operation::Predict,
        },
        ToolDescriptor {
            name: "list_models",
            title: "List models",
            description: "List public models, at most five per page, optionally filtered by owner.",
            input_schema: ParameterSchema::object()
                .property("owner", PropertyRule::string().describe("Only keep models from this owner"))
                .property("cursor", cursor())
                .closed(),
            read_only: true,
            operation: Operation::ListModels,
        },
        ToolDescriptor {
            name: "get_model_versions",
            title: "Get model versions",
            description: "List the published versions of a model.",
            input_schema: ParameterSchema::object().required_property("model", model_id()).closed(),
            read_only: true,
            operation: Operation::GetModelVersions,
        },
        ToolDescriptor {
            name: "get_prediction_status",
            title: "Get prediction status",
            description: "Fetch the current state of a prediction.",
            input_schema: ParameterSchema::object()
                .required_property("prediction_id", prediction_id())
                .closed(),
            read_only: true,
            operation: Operation::GetPredictionStatus,
        },
        ToolDescriptor {
            name: "cancel_prediction",
            title: "Cancel prediction",
            description: "Cancel a running prediction and return its updated state.",
            input_schema: ParameterSchema::object()
                .required_property("prediction_id", prediction_id())
                .closed(),
            read_only: false,
            operation: Operation::CancelPrediction,
        },
        ToolDescriptor {
            name: "list_predictions",
            title: "List predictions",
            description: "List recent predictions, optionally filtered by status.",
            input_schema: ParameterSchema::object()
                .property(
                    "status",
                    PropertyRule::string()
                        .one_of(PredictionStatus::ALL.map(|status| status.as_str()))
                        .describe("Only keep predictions in this state"),
                )
                .property(
                    "limit",
                    PropertyRule::integer()
                        .range(*PREDICTION_LIMIT_RANGE.start() as f64, *PREDICTION_LIMIT_RANGE.end() as f64)
                        .describe("Maximum number of predictions (default 10)"),
                )
                .closed(),
            read_only: true,
            operation: Operation::ListPredictions,
        },
        ToolDescriptor {
            name: "search_models",
            title: "Search models",
            description: "Search public models by free text.",
            input_schema: ParameterSchema::object()
                .required_property("query", PropertyRule::non_empty_string().describe("Search text"))
                .property("cursor", cursor())
                .closed(),
            read_only: true,
            operation: Operation::SearchModels,
        },
        ToolDescriptor {
            name: "list_hardware",
            title: "List hardware",
            description: "List the hardware SKUs models can run on.",
            input_schema: ParameterSchema::object().closed(),
            read_only: true,
            operation: Operation::ListHardware,
        },
        ToolDescriptor {
            name: "list_collections",
            title: "List collections",
            description: "List curated model collections.",
            input_schema: ParameterSchema::object().closed(),
            read_only: true,
            operation: Operation::ListCollections,
        },
        ToolDescriptor {
            name: "get_collection",
            title: "Get collection",
            description: "Fetch a collection and the models it contains.",
            input_schema: ParameterSchema::object()
                .required_property("collection_slug", PropertyRule::non_empty_string().describe("Collection slug"))
                .closed(),
            read_only: true,
            operation: Operation::GetCollection,
        },
        ToolDescriptor {
            name: "get_webhook_secret",
            title: "Get webhook secret",
            description: "Fetch the signing secret used to verify webhook deliveries.",
            input_schema: ParameterSchema::object().closed(),
            read_only: true,
            operation: Operation::GetWebhookSecret,
        },
        ToolDescriptor {
            name: "list_templates",
            title: "List templates",
            description: "List the built-in parameter templates with their defaults and rules.",
            input_schema: ParameterSchema::object().closed(),
            read_only: true,
            operation: Operation::ListTemplates,
        },
        ToolDescriptor {
            name: "validate_template",
            title: "Validate template parameters",
            description: "Check parameters against a template and return them merged with its defaults.",
            input_schema: ParameterSchema::object()
                .required_property("template", PropertyRule::non_empty_string().describe("Parameter template id"))
                .property("parameters", PropertyRule::object().describe("Parameters to check"))
                .closed(),
            read_only: true,
            operation: Operation::ValidateTemplate,
        },
    ]
}
