//! Server configuration file.
//!
//! Handles locating, parsing, and validating the optional
//! `~/.config/replicate-mcp/config.json` file.

mod io;
mod model;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path, validate_config};
pub use model::{ConfigError, MAX_TIMEOUT_SECONDS, ServerConfig, Transport};

/// JSON schema of the config file.
pub fn config_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ServerConfig)).unwrap_or(serde_json::Value::Null)
}
