//! Model Context Protocol (MCP) tool server for the Replicate API.
//!
//! - [`tools`]: tool descriptors and their input schemas.
//! - [`dispatch`]: validates a tool call and runs it against the adapter.
//! - [`server`]: the rmcp `ServerHandler` plus stdio and HTTP transports.
//! - [`config`]: the optional JSON config file.

pub mod config;
pub mod dispatch;
mod errors;
pub mod server;
pub mod tools;

use std::sync::Arc;

use replicate_mcp_api::ReplicateApi;
use replicate_mcp_registry::{RegistryError, TemplateRegistry};

pub use dispatch::Dispatcher;
pub use errors::DispatchError;
pub use server::ReplicateMcpServer;
pub use tools::{Operation, ToolDescriptor, ToolRegistry};

/// Builds a server with every built-in tool and template over `api`.
///
/// Fails only when the built-in template families collide.
pub fn build_server(api: Arc<dyn ReplicateApi>) -> Result<ReplicateMcpServer, RegistryError> {
    let templates = Arc::new(TemplateRegistry::builtin()?);
    let tools = Arc::new(ToolRegistry::builtin());
    let dispatcher = Dispatcher::new(tools, templates, api);
    Ok(ReplicateMcpServer::new(Arc::new(dispatcher)))
}
