use async_trait::async_trait;
use replicate_mcp_types::{
    CollectionDetail, CollectionSummary, Hardware, ModelPage, ModelVersion, Prediction, PredictionStatus, SearchPage, WebhookEvent,
    WebhookSecret,
};
use serde_json::{Map, Value};

use crate::ApiError;

/// Largest page `list_models` returns, whatever the upstream page size.
pub const MODEL_PAGE_CAP: usize = 5;
pub const DEFAULT_PREDICTION_LIMIT: i64 = 10;
pub const PREDICTION_LIMIT_RANGE: std::ops::RangeInclusive<i64> = 1..=100;
pub const DEFAULT_WAIT_SECONDS: i64 = 60;
pub const WAIT_SECONDS_RANGE: std::ops::RangeInclusive<i64> = 1..=60;

/// Arguments for [`ReplicateApi::create_prediction`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePrediction {
    /// `owner/name` identifier.
    pub model: String,
    pub input: Map<String, Value>,
    /// Version id; the model's latest version when absent.
    pub version: Option<String>,
    /// Ask the service to hold the response until the prediction finishes.
    pub wait: bool,
    /// Server-side wait bound, within [`WAIT_SECONDS_RANGE`].
    pub wait_timeout_seconds: Option<i64>,
    pub stream: bool,
    pub webhook: Option<String>,
    pub webhook_events_filter: Option<Vec<WebhookEvent>>,
}

impl CreatePrediction {
    pub fn new(model: impl Into<String>, input: Map<String, Value>) -> Self {
        Self {
            model: model.into(),
            input,
            ..Default::default()
        }
    }
}

/// One operation per remote capability.
///
/// Callers shape and validate arguments first; implementations still reject
/// out-of-range values with `InvalidArgument` before touching the network.
/// No operation retries.
#[async_trait]
pub trait ReplicateApi: Send + Sync {
    /// A page of at most [`MODEL_PAGE_CAP`] models, filtered to `owner` after fetching.
    async fn list_models(&self, owner: Option<&str>, cursor: Option<&str>) -> Result<ModelPage, ApiError>;

    async fn get_model_versions(&self, model: &str) -> Result<Vec<ModelVersion>, ApiError>;

    async fn create_prediction(&self, request: CreatePrediction) -> Result<Prediction, ApiError>;

    async fn get_prediction_status(&self, prediction_id: &str) -> Result<Prediction, ApiError>;

    async fn cancel_prediction(&self, prediction_id: &str) -> Result<Prediction, ApiError>;

    /// Recent predictions, optionally filtered by status; `limit` defaults to 10.
    async fn list_predictions(&self, status: Option<PredictionStatus>, limit: Option<i64>) -> Result<Vec<Prediction>, ApiError>;

    async fn search_models(&self, query: &str, cursor: Option<&str>) -> Result<SearchPage, ApiError>;

    async fn list_hardware(&self) -> Result<Vec<Hardware>, ApiError>;

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, ApiError>;

    async fn get_collection(&self, slug: &str) -> Result<CollectionDetail, ApiError>;

    async fn get_webhook_secret(&self) -> Result<WebhookSecret, ApiError>;
}
