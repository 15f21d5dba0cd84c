//! Stdio transport. Stdout carries protocol frames only.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tracing::info;

use crate::server::core::ReplicateMcpServer;

/// Serves over stdin/stdout until the host closes the stream.
pub async fn serve_stdio(server: ReplicateMcpServer) -> Result<()> {
    info!("serving MCP over stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    let reason = service.waiting().await.context("MCP stdio session failed")?;
    info!(?reason, "MCP stdio session ended");
    Ok(())
}
