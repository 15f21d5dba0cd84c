//! Prediction records.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_helpers::{null_as_default, optional_text};

/// Lifecycle state reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub const ALL: [PredictionStatus; 5] = [
        PredictionStatus::Starting,
        PredictionStatus::Processing,
        PredictionStatus::Succeeded,
        PredictionStatus::Failed,
        PredictionStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a prediction webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEvent {
    Start,
    Output,
    Logs,
    Completed,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 4] = [WebhookEvent::Start, WebhookEvent::Output, WebhookEvent::Logs, WebhookEvent::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::Start => "start",
            WebhookEvent::Output => "output",
            WebhookEvent::Logs => "logs",
            WebhookEvent::Completed => "completed",
        }
    }
}

/// In-memory projection of a remote prediction.
///
/// Recreated from every status query; the server never owns the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: PredictionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: Map<String, Value>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default, deserialize_with = "optional_text")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: IndexMap<String, String>,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
}

impl Prediction {
    /// Live-output channel URL, present only when the service issued one.
    pub fn stream_url(&self) -> Option<&str> {
        self.urls.get("stream").map(String::as_str)
    }
}

/// Body of a prediction creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_events_filter: Option<Vec<WebhookEvent>>,
}

/// Signing secret for the account's default webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSecret {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_remote_payload() {
        let payload = json!({
            "id": "gm3qorzdhgbfurvjtvhg6dckhu",
            "model": "stability-ai/sdxl",
            "version": "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa",
            "status": "succeeded",
            "input": { "prompt": "an astronaut" },
            "output": ["https://replicate.delivery/out-0.png"],
            "error": null,
            "logs": "step 1/50",
            "created_at": "2024-01-01T00:00:00.123456Z",
            "started_at": "2024-01-01T00:00:01Z",
            "completed_at": "2024-01-01T00:00:02Z",
            "urls": {
                "get": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu",
                "cancel": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu/cancel"
            },
            "metrics": { "predict_time": 1.0 }
        });

        let prediction: Prediction = serde_json::from_value(payload).expect("prediction parses");
        assert_eq!(prediction.status, PredictionStatus::Succeeded);
        assert_eq!(prediction.model.as_deref(), Some("stability-ai/sdxl"));
        assert!(prediction.created_at.is_some());
        assert_eq!(prediction.urls.len(), 2);
        assert!(prediction.stream_url().is_none());
    }

    #[test]
    fn tolerates_null_maps_and_structured_errors() {
        let payload = json!({
            "id": "p1",
            "status": "failed",
            "input": null,
            "urls": null,
            "error": { "detail": "CUDA out of memory" }
        });

        let prediction: Prediction = serde_json::from_value(payload).expect("prediction parses");
        assert!(prediction.input.is_empty());
        assert!(prediction.urls.is_empty());
        assert!(prediction.error.as_deref().is_some_and(|text| text.contains("CUDA")));
        assert!(prediction.created_at.is_none());
    }

    #[test]
    fn request_omits_unset_optionals() {
        let request = PredictionRequest {
            version: "v1".into(),
            input: Map::new(),
            stream: None,
            webhook: None,
            webhook_events_filter: None,
        };
        let encoded = serde_json::to_value(&request).expect("serializes");
        assert_eq!(encoded, json!({ "version": "v1", "input": {} }));
    }
}
