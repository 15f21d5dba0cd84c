use std::{env, fmt, time::Duration};

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
pub const API_BASE_ENV: &str = "REPLICATE_API_BASE";

/// Hostnames allowed to use plain `http` for local development.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("API base URL must use https for non-localhost hosts; got '{scheme}://{host}'")]
    InsecureBaseUrl { scheme: String, host: String },

    #[error("API token contains characters that cannot be sent in a header")]
    InvalidToken,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Connection settings for the Replicate adapter.
///
/// A missing or blank token is allowed here: the client built from it stays
/// usable but answers every operation with `Unconfigured`.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_token: Option<String>,
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ApiConfig {
    /// Settings for the public endpoint with the default timeout.
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token,
            base_url: default_base_url(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("replicate-mcp/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        }
    }

    /// Reads `REPLICATE_API_TOKEN` and `REPLICATE_API_BASE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::new(env::var(API_TOKEN_ENV).ok());
        match env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => config.with_base_url(&base),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Result<Self, ConfigError> {
        self.base_url = validate_base_url(base)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The token, if present and not blank.
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().map(str::trim).filter(|token| !token.is_empty())
    }
}

fn default_base_url() -> Url {
    // A constant that always parses.
    Url::parse(DEFAULT_API_BASE).unwrap_or_else(|_| unreachable!("default API base is a valid URL"))
}

/// Validate that a base URL is acceptable for use by the client.
///
/// `localhost` and loopback addresses may use any scheme; every other host
/// must use https.
pub fn validate_base_url(base: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(base.trim()).map_err(|error| ConfigError::InvalidBaseUrl {
        value: base.to_string(),
        reason: error.to_string(),
    })?;

    let host = parsed.host_str().ok_or_else(|| ConfigError::InvalidBaseUrl {
        value: base.to_string(),
        reason: "URL must include a host".to_string(),
    })?;

    if LOCALHOST_DOMAINS.iter().any(|allowed| host.eq_ignore_ascii_case(allowed)) {
        return Ok(parsed);
    }

    if parsed.scheme() != "https" {
        return Err(ConfigError::InsecureBaseUrl {
            scheme: parsed.scheme().to_string(),
            host: host.to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_and_local_hosts() {
        assert!(validate_base_url("https://api.replicate.com/v1").is_ok());
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://127.0.0.1:9999/v1").is_ok());
    }

    #[test]
    fn rejects_plain_http_for_remote_hosts() {
        let error = validate_base_url("http://api.replicate.com/v1").expect_err("insecure");
        assert!(matches!(error, ConfigError::InsecureBaseUrl { .. }));
        assert!(matches!(validate_base_url("not a url"), Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn blank_tokens_count_as_missing() {
        assert_eq!(ApiConfig::new(Some("  ".into())).token(), None);
        assert_eq!(ApiConfig::new(Some(" r8_x ".into())).token(), Some("r8_x"));
        assert_eq!(ApiConfig::new(None).token(), None);
    }

    #[test]
    fn debug_output_hides_the_token() {
        let rendered = format!("{:?}", ApiConfig::new(Some("r8_supersecret".into())));
        assert!(!rendered.contains("r8_supersecret"));
    }

    #[test]
    fn from_env_reads_token_and_base() {
        temp_env::with_vars(
            [(API_TOKEN_ENV, Some("r8_env")), (API_BASE_ENV, Some("http://localhost:4010"))],
            || {
                let config = ApiConfig::from_env().expect("env config");
                assert_eq!(config.token(), Some("r8_env"));
                assert_eq!(config.base_url.as_str(), "http://localhost:4010/");
                assert_eq!(config.timeout, DEFAULT_TIMEOUT);
            },
        );
        temp_env::with_vars([(API_TOKEN_ENV, None::<&str>), (API_BASE_ENV, None::<&str>)], || {
            let config = ApiConfig::from_env().expect("env config");
            assert_eq!(config.token(), None);
            assert_eq!(config.base_url.as_str(), "https://api.replicate.com/v1");
        });
    }
}
