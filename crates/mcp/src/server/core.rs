use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, Implementation, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::server::errors::{cancelled_error, to_error_data};

const INSTRUCTIONS: &str = "Tools for the Replicate model API.\n\
FLOW:\n\
1) Find a model with search_models or list_models.\n\
2) Inspect it with get_model_versions.\n\
3) Run it with predict; set wait=true to block up to wait_timeout_seconds.\n\
4) Poll get_prediction_status with the returned id until the status is succeeded, failed, or canceled.\n\
TEMPLATES:\n\
- list_templates shows parameter templates with defaults and rules.\n\
- Pass template=<id> to predict, or call validate_template first, to check and pre-fill input.";

/// MCP server exposing the Replicate tools.
#[derive(Debug, Clone)]
pub struct ReplicateMcpServer {
    dispatcher: Arc<Dispatcher>,
}

impl ReplicateMcpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl ServerHandler for ReplicateMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "replicate-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Replicate MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.dispatcher.tools().to_rmcp_tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move { run_tool_call(&self.dispatcher, &request.name, request.arguments, &context.ct).await }
    }
}

/// Runs one tool call unless `cancellation` fires first.
///
/// Losing the race drops the dispatch future along with any adapter request
/// still in flight.
pub(crate) async fn run_tool_call(
    dispatcher: &Dispatcher,
    name: &str,
    arguments: Option<Map<String, Value>>,
    cancellation: &CancellationToken,
) -> Result<CallToolResult, ErrorData> {
    tokio::select! {
        outcome = dispatcher.dispatch(name, arguments) => match outcome {
            Ok(content) => Ok(CallToolResult::structured(content)),
            Err(error) => Err(to_error_data(name, &error)),
        },
        _ = cancellation.cancelled() => {
            info!(tool = %name, "tool call cancelled by host");
            Err(cancelled_error(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use async_trait::async_trait;
    use replicate_mcp_api::{ApiError, CreatePrediction, ReplicateApi};
    use replicate_mcp_registry::TemplateRegistry;
    use replicate_mcp_types::{
        CollectionDetail, CollectionSummary, Hardware, ModelPage, ModelVersion, Prediction, PredictionStatus, SearchPage, WebhookSecret,
    };
    use tokio::sync::Notify;

    use crate::tools::ToolRegistry;

    /// Adapter whose calls never finish; records when a call starts and when it is dropped.
    #[derive(Default)]
    struct StalledApi {
        started: Notify,
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl StalledApi {
        async fn stall<T>(&self) -> Result<T, ApiError> {
            let _flag = DropFlag(self.dropped.clone());
            self.started.notify_one();
            std::future::pending().await
        }
    }

    #[async_trait]
    impl ReplicateApi for StalledApi {
        async fn list_models(&self, _owner: Option<&str>, _cursor: Option<&str>) -> Result<ModelPage, ApiError> {
            self.stall().await
        }

        async fn get_model_versions(&self, _model: &str) -> Result<Vec<ModelVersion>, ApiError> {
            self.stall().await
        }

        async fn create_prediction(&self, _request: CreatePrediction) -> Result<Prediction, ApiError> {
            self.stall().await
        }

        async fn get_prediction_status(&self, _prediction_id: &str) -> Result<Prediction, ApiError> {
            self.stall().await
        }

        async fn cancel_prediction(&self, _prediction_id: &str) -> Result<Prediction, ApiError> {
            self.stall().await
        }

        async fn list_predictions(&self, _status: Option<PredictionStatus>, _limit: Option<i64>) -> Result<Vec<Prediction>, ApiError> {
            self.stall().await
        }

        async fn search_models(&self, _query: &str, _cursor: Option<&str>) -> Result<SearchPage, ApiError> {
            self.stall().await
        }

        async fn list_hardware(&self) -> Result<Vec<Hardware>, ApiError> {
            self.stall().await
        }

        async fn list_collections(&self) -> Result<Vec<CollectionSummary>, ApiError> {
            self.stall().await
        }

        async fn get_collection(&self, _slug: &str) -> Result<CollectionDetail, ApiError> {
            self.stall().await
        }

        async fn get_webhook_secret(&self) -> Result<WebhookSecret, ApiError> {
            self.stall().await
        }
    }

    fn dispatcher(api: Arc<StalledApi>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(ToolRegistry::builtin()),
            Arc::new(TemplateRegistry::builtin().expect("builtin templates")),
            api,
        )
    }

    #[tokio::test]
    async fn cancellation_drops_the_pending_adapter_call() {
        let api = Arc::new(StalledApi::default());
        let dispatcher = dispatcher(api.clone());
        let token = CancellationToken::new();

        let cancel = async {
            api.started.notified().await;
            token.cancel();
        };
        let (outcome, ()) = tokio::join!(run_tool_call(&dispatcher, "list_hardware", None, &token), cancel);

        let error = outcome.expect_err("cancelled call");
        let expected = cancelled_error("list_hardware");
        assert_eq!(error.code, expected.code);
        assert_eq!(error.message, expected.message);
        assert_eq!(error.data.expect("payload")["cancelled"], json!(true));
        assert!(api.dropped.load(Ordering::SeqCst), "adapter future still alive");
    }

    #[tokio::test]
    async fn uncancelled_calls_return_structured_content() {
        let api = Arc::new(StalledApi::default());
        let result = run_tool_call(&dispatcher(api.clone()), "list_templates", None, &CancellationToken::new())
            .await
            .expect("template listing");
        let content = result.structured_content.expect("structured content");
        assert!(content["templates"].as_array().is_some_and(|templates| !templates.is_empty()));
        assert!(!api.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn dispatch_failures_are_not_reported_as_cancellation() {
        let api = Arc::new(StalledApi::default());
        let error = run_tool_call(&dispatcher(api), "delete_everything", None, &CancellationToken::new())
            .await
            .expect_err("unknown tool");
        assert_eq!(error.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }
}
