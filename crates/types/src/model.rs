//! Model, version, and listing records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Whether a model is visible to everyone or only its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// A published version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cog_version: Option<String>,
    #[serde(default)]
    pub openapi_schema: Option<Value>,
}

/// A model as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_count: Option<u64>,
    #[serde(default)]
    pub latest_version: Option<ModelVersion>,
}

impl Model {
    /// Flattened listing shape.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            owner: self.owner.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            visibility: self.visibility,
            latest_version_id: self.latest_version.as_ref().map(|version| version.id.clone()),
            latest_version_created_at: self.latest_version.as_ref().and_then(|version| version.created_at),
        }
    }
}

/// Flattened model record returned by listing and search tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_created_at: Option<DateTime<Utc>>,
}

/// One capped page of `list_models` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPage {
    pub models: Vec<ModelSummary>,
    pub next_cursor: Option<String>,
    pub total_models: Option<u64>,
}

/// One page of search output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub models: Vec<ModelSummary>,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}

/// Error for identifiers that are not of the form `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model identifier '{0}' must be in 'owner/name' format")]
pub struct InvalidModelId(pub String);

/// Parsed `owner/name` model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    pub owner: String,
    pub name: String,
}

impl FromStr for ModelId {
    type Err = InvalidModelId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (owner, name) = trimmed.split_once('/').ok_or_else(|| InvalidModelId(value.to_string()))?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(InvalidModelId(value.to_string()));
        }
        Ok(ModelId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
