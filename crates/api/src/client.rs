use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use replicate_mcp_types::{
    CollectionDetail, CollectionSummary, Hardware, Model, ModelId, ModelPage, ModelVersion, Page, Prediction, PredictionRequest,
    PredictionStatus, SearchPage, WebhookSecret,
};
use replicate_mcp_util::{cursor_from_url, error_detail};
use reqwest::{
    Client, Method, RequestBuilder,
    header::{self, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    ApiConfig, ApiError, ConfigError,
    error::Target,
    operations::{
        CreatePrediction, DEFAULT_PREDICTION_LIMIT, DEFAULT_WAIT_SECONDS, MODEL_PAGE_CAP, PREDICTION_LIMIT_RANGE, ReplicateApi,
        WAIT_SECONDS_RANGE,
    },
};

/// Characters left unescaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Extra time granted beyond a server-side wait before the local timeout fires.
const WAIT_GRACE: Duration = Duration::from_secs(5);

/// Thin wrapper around a configured `reqwest::Client` for Replicate API access.
///
/// Default headers carry the bearer token; requests resolve against a
/// validated base URL. One long-lived instance is shared by all concurrent
/// tool calls.
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    base_url: String,
    http: Client,
    timeout: Duration,
    configured: bool,
}

impl ReplicateClient {
    /// Builds the HTTP client. A missing token yields a client whose every operation fails with
    /// [`ApiError::Unconfigured`].
    pub fn new(config: ApiConfig) -> Result<Self, ConfigError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let configured = match config.token() {
            Some(token) => {
                let mut authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ConfigError::InvalidToken)?;
                authorization.set_sensitive(true);
                default_headers.insert(header::AUTHORIZATION, authorization);
                true
            }
            None => {
                warn!("no Replicate API token configured; every operation will fail as unconfigured");
                false
            }
        };

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            http,
            timeout: config.timeout,
            configured,
        })
    }

    fn ensure_configured(&self, operation: &'static str) -> Result<(), ApiError> {
        if self.configured {
            return Ok(());
        }
        debug!(operation, "rejecting call on unconfigured client");
        Err(ApiError::Unconfigured)
    }

    async fn get<T: DeserializeOwned>(&self, operation: &'static str, path: &str, target: Option<Target>) -> Result<T, ApiError> {
        self.send(operation, Method::GET, path, target, |request| request).await
    }

    /// Issues one request and decodes the JSON response.
    ///
    /// Failures are logged here, once, and returned unchanged.
    async fn send<T, F>(&self, operation: &'static str, method: Method, path: &str, target: Option<Target>, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(operation, %method, %url, "sending request");

        let result = self.exchange(operation, method, &url, path, target, build).await;
        if let Err(error) = &result {
            warn!(operation, kind = %error.kind(), error = %error, "replicate request failed");
        }
        result
    }

    async fn exchange<T, F>(
        &self,
        operation: &'static str,
        method: Method,
        url: &str,
        path: &str,
        target: Option<Target>,
        build: F,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let response = build(self.http.request(method, url))
            .send()
            .await
            .map_err(|error| ApiError::from_transport(operation, &error))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| ApiError::from_transport(operation, &error))?;
        debug!(operation, status = %status, bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(ApiError::from_status(operation, status.as_u16(), error_detail(&body), target.as_ref(), path));
        }

        serde_json::from_str(&body).map_err(|error| ApiError::RemoteError {
            operation,
            status: Some(status.as_u16()),
            message: format!("unexpected response body: {error}"),
        })
    }

    /// Version id to run: the requested one after confirming it exists, else the model's latest.
    ///
    /// A missing version is reported as `owner/name:version` so the model is named too.
    async fn resolve_version(&self, model: &ModelId, version: Option<&str>) -> Result<String, ApiError> {
        let model_path = format!("/models/{}/{}", segment(&model.owner), segment(&model.name));
        match version {
            Some(version) => {
                let record: ModelVersion = self
                    .get(
                        "get_model_version",
                        &format!("{model_path}/versions/{}", segment(version)),
                        Some(Target::new("version", format!("{model}:{version}"))),
                    )
                    .await?;
                Ok(record.id)
            }
            None => {
                let record: Model = self.get("get_model", &model_path, Some(Target::new("model", model.to_string()))).await?;
                record
                    .latest_version
                    .map(|latest| latest.id)
                    .ok_or_else(|| ApiError::not_found("latest version of model", model.to_string()))
            }
        }
    }
}

fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

fn parse_model(model: &str) -> Result<ModelId, ApiError> {
    model.parse::<ModelId>().map_err(|error| ApiError::invalid_argument("model", error.to_string()))
}

fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_argument(field, "must not be empty"));
    }
    Ok(trimmed)
}

fn validate_webhook(webhook: &str) -> Result<(), ApiError> {
    let parsed = Url::parse(webhook).map_err(|error| ApiError::invalid_argument("webhook", format!("not a valid URL: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::invalid_argument("webhook", "must be an http(s) URL"));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[async_trait]
impl ReplicateApi for ReplicateClient {
    async fn list_models(&self, owner: Option<&str>, cursor: Option<&str>) -> Result<ModelPage, ApiError> {
        self.ensure_configured("list_models")?;
        let cursor = non_blank(cursor);
        let page: Page<Model> = self
            .send("list_models", Method::GET, "/models", None, |request| match cursor {
                Some(cursor) => request.query(&[("cursor", cursor)]),
                None => request,
            })
            .await?;

        // Owner filtering happens on the fetched page, so a filtered page may be short.
        let owner = non_blank(owner);
        let models = page
            .results
            .iter()
            .filter(|model| owner.is_none_or(|owner| model.owner.eq_ignore_ascii_case(owner)))
            .take(MODEL_PAGE_CAP)
            .map(Model::summary)
            .collect();

        Ok(ModelPage {
            models,
            next_cursor: page.next.as_deref().and_then(cursor_from_url),
            total_models: page.total,
        })
    }

    async fn get_model_versions(&self, model: &str) -> Result<Vec<ModelVersion>, ApiError> {
        self.ensure_configured("get_model_versions")?;
        let model_id = parse_model(model)?;
        let path = format!("/models/{}/{}/versions", segment(&model_id.owner), segment(&model_id.name));
        let page: Page<ModelVersion> = self
            .get("get_model_versions", &path, Some(Target::new("model", model_id.to_string())))
            .await?;
        Ok(page.results)
    }

    async fn create_prediction(&self, request: CreatePrediction) -> Result<Prediction, ApiError> {
        self.ensure_configured("create_prediction")?;
        let model_id = parse_model(&request.model)?;
        if let Some(seconds) = request.wait_timeout_seconds
            && !WAIT_SECONDS_RANGE.contains(&seconds)
        {
            return Err(ApiError::invalid_argument(
                "wait_timeout_seconds",
                format!("must be between 1 and 60 seconds, got {seconds}"),
            ));
        }
        if let Some(webhook) = &request.webhook {
            validate_webhook(webhook)?;
        }

        let version = self.resolve_version(&model_id, non_blank(request.version.as_deref())).await?;
        let wait_seconds = request.wait.then(|| request.wait_timeout_seconds.unwrap_or(DEFAULT_WAIT_SECONDS));
        let body = PredictionRequest {
            version,
            input: request.input,
            stream: request.stream.then_some(true),
            webhook: request.webhook,
            webhook_events_filter: request.webhook_events_filter,
        };

        let timeout = self.timeout;
        self.send("create_prediction", Method::POST, "/predictions", None, |builder| {
            let builder = builder.json(&body);
            match wait_seconds {
                Some(seconds) => {
                    let held = Duration::from_secs(seconds.unsigned_abs()) + WAIT_GRACE;
                    builder.header("Prefer", format!("wait={seconds}")).timeout(timeout.max(held))
                }
                None => builder,
            }
        })
        .await
    }

    async fn get_prediction_status(&self, prediction_id: &str) -> Result<Prediction, ApiError> {
        self.ensure_configured("get_prediction_status")?;
        let prediction_id = require_non_blank("prediction_id", prediction_id)?;
        self.get(
            "get_prediction_status",
            &format!("/predictions/{}", segment(prediction_id)),
            Some(Target::new("prediction", prediction_id)),
        )
        .await
    }

    async fn cancel_prediction(&self, prediction_id: &str) -> Result<Prediction, ApiError> {
        self.ensure_configured("cancel_prediction")?;
        let prediction_id = require_non_blank("prediction_id", prediction_id)?;
        self.send(
            "cancel_prediction",
            Method::POST,
            &format!("/predictions/{}/cancel", segment(prediction_id)),
            Some(Target::new("prediction", prediction_id)),
            |request| request,
        )
        .await
    }

    async fn list_predictions(&self, status: Option<PredictionStatus>, limit: Option<i64>) -> Result<Vec<Prediction>, ApiError> {
        self.ensure_configured("list_predictions")?;
        let limit = limit.unwrap_or(DEFAULT_PREDICTION_LIMIT);
        if !PREDICTION_LIMIT_RANGE.contains(&limit) {
            return Err(ApiError::invalid_argument("limit", format!("must be between 1 and 100, got {limit}")));
        }

        let page: Page<Prediction> = self.get("list_predictions", "/predictions", None).await?;
        Ok(page
            .results
            .into_iter()
            .filter(|prediction| status.is_none_or(|wanted| prediction.status == wanted))
            .take(limit.unsigned_abs() as usize)
            .collect())
    }

    async fn search_models(&self, query: &str, cursor: Option<&str>) -> Result<SearchPage, ApiError> {
        self.ensure_configured("search_models")?;
        let query = require_non_blank("query", query)?;
        let method = Method::from_bytes(b"QUERY").map_err(|error| ApiError::RemoteError {
            operation: "search_models",
            status: None,
            message: error.to_string(),
        })?;
        let cursor = non_blank(cursor);

        let page: Page<Model> = self
            .send("search_models", method, "/models", None, |request| {
                let request = request.header(header::CONTENT_TYPE, "text/plain").body(query.to_string());
                match cursor {
                    Some(cursor) => request.query(&[("cursor", cursor)]),
                    None => request,
                }
            })
            .await?;

        Ok(SearchPage {
            models: page.results.iter().map(Model::summary).collect(),
            next_cursor: page.next.as_deref().and_then(cursor_from_url),
            previous_cursor: page.previous.as_deref().and_then(cursor_from_url),
        })
    }

    async fn list_hardware(&self) -> Result<Vec<Hardware>, ApiError> {
        self.ensure_configured("list_hardware")?;
        self.get("list_hardware", "/hardware", None).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, ApiError> {
        self.ensure_configured("list_collections")?;
        let page: Page<CollectionSummary> = self.get("list_collections", "/collections", None).await?;
        Ok(page.results)
    }

    async fn get_collection(&self, slug: &str) -> Result<CollectionDetail, ApiError> {
        self.ensure_configured("get_collection")?;
        let slug = require_non_blank("collection_slug", slug)?;
        self.get(
            "get_collection",
            &format!("/collections/{}", segment(slug)),
            Some(Target::new("collection", slug)),
        )
        .await
    }

    async fn get_webhook_secret(&self) -> Result<WebhookSecret, ApiError> {
        self.ensure_configured("get_webhook_secret")?;
        self.get("get_webhook_secret", "/webhooks/default/secret", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_escaped() {
        assert_eq!(segment("stability-ai"), "stability-ai");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn webhook_urls_must_be_http() {
        assert!(validate_webhook("https://example.com/hook").is_ok());
        assert_eq!(validate_webhook("ftp://example.com").map_err(|e| e.field().map(str::to_string)), Err(Some("webhook".into())));
        assert!(validate_webhook("::").is_err());
    }
}
