//! Config file location, loading, and validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};
use replicate_mcp_api::validate_base_url;
use tracing::debug;

use crate::config::{ConfigError, MAX_TIMEOUT_SECONDS, ServerConfig};
use crate::server::resolve_bind_address;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "REPLICATE_MCP_CONFIG";

/// Returns the default config file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_home(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replicate-mcp")
        .join("config.json")
}

/// Loads the config from the default path.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    load_config_from_path(&default_config_path())
}

/// Loads and validates the config at `path`. A missing file yields defaults.
pub fn load_config_from_path(path: &Path) -> Result<ServerConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ServerConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: ServerConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })?;
    validate_config(&config)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Checks field values that serde cannot.
pub fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(api_base) = config.api_base.as_deref() {
        validate_base_url(api_base).map_err(|error| ConfigError::Invalid {
            field: "apiBase",
            reason: error.to_string(),
        })?;
    }

    if let Some(seconds) = config.timeout_seconds
        && !(1..=MAX_TIMEOUT_SECONDS).contains(&seconds)
    {
        return Err(ConfigError::Invalid {
            field: "timeoutSeconds",
            reason: format!("must be between 1 and {MAX_TIMEOUT_SECONDS}"),
        });
    }

    if let Some(bind_address) = config.bind_address.as_deref() {
        resolve_bind_address(Some(bind_address)).map_err(|error| ConfigError::Invalid {
            field: "bindAddress",
            reason: error.to_string(),
        })?;
    }

    Ok(())
}

fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let rest = match trimmed {
        "~" => "",
        _ => match trimmed.strip_prefix("~/") {
            Some(rest) => rest,
            None => return PathBuf::from(trimmed),
        },
    };
    match home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(trimmed),
    }
}
