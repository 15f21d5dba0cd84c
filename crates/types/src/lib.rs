//! Value records shared across the Replicate MCP workspace.
//!
//! Every type here is a transient projection of remote data: it is built from
//! a single response, handed to the caller, and dropped. Nothing in this crate
//! owns state that outlives a request/response cycle.
//!
//! Optional upstream fields are explicit `Option`s; absence is never inferred.

pub mod collection;
mod error_kind;
pub mod hardware;
pub mod model;
pub mod page;
pub mod prediction;
mod serde_helpers;

pub use collection::{CollectionDetail, CollectionSummary};
pub use error_kind::ErrorKind;
pub use hardware::Hardware;
pub use model::{InvalidModelId, Model, ModelId, ModelPage, ModelSummary, ModelVersion, SearchPage, Visibility};
pub use page::Page;
pub use prediction::{Prediction, PredictionRequest, PredictionStatus, WebhookEvent, WebhookSecret};
