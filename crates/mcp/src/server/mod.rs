//! MCP server handler and its transports.

mod core;
mod errors;
mod http;
mod stdio;

pub use core::ReplicateMcpServer;
pub use errors::{cancelled_error, to_error_data};
pub use http::{DEFAULT_BIND_ADDRESS, McpHttpServer, RunningMcpHttpServer, resolve_bind_address, serve_http};
pub use stdio::serve_stdio;
