use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted per-request timeout.
pub const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Transport the server speaks to its host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Protocol frames over stdin/stdout.
    #[default]
    Stdio,
    /// Streamable HTTP under `/mcp` on a loopback address.
    Http,
}

/// Settings read from `config.json`.
///
/// Every field is optional; command-line flags override whatever is set
/// here. The API token is deliberately not a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    /// Replicate API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
    /// Loopback `host:port` for the HTTP transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,
}

impl ServerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Overlays `other` on `self`; set fields in `other` win.
    pub fn merged_with(self, other: ServerConfig) -> ServerConfig {
        ServerConfig {
            api_base: other.api_base.or(self.api_base),
            timeout_seconds: other.timeout_seconds.or(self.timeout_seconds),
            transport: other.transport.or(self.transport),
            bind_address: other.bind_address.or(self.bind_address),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
