//! Replicate API adapter.
//!
//! This crate provides a lightweight client for the Replicate HTTP API.
//! It focuses on:
//!
//! - Building an HTTP client with bearer authentication and a bounded timeout
//! - Validating the API base URL
//! - Classifying every failure into one [`ApiError`] variant
//!
//! The [`ReplicateApi`] trait is the seam the tool dispatcher depends on;
//! [`ReplicateClient`] is the production implementation.
//!
//! # Example
//!
//! ```no_run
//! use replicate_mcp_api::{ApiConfig, ReplicateApi, ReplicateClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReplicateClient::new(ApiConfig::from_env()?)?;
//! let page = client.list_models(Some("stability-ai"), None).await?;
//! println!("{} models", page.models.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod operations;

pub use client::ReplicateClient;
pub use config::{API_BASE_ENV, API_TOKEN_ENV, ApiConfig, ConfigError, DEFAULT_API_BASE, DEFAULT_TIMEOUT, validate_base_url};
pub use error::ApiError;
pub use operations::{
    CreatePrediction, DEFAULT_PREDICTION_LIMIT, DEFAULT_WAIT_SECONDS, MODEL_PAGE_CAP, PREDICTION_LIMIT_RANGE, ReplicateApi,
    WAIT_SECONDS_RANGE,
};
