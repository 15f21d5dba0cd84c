//! Streamable-HTTP transport.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::core::ReplicateMcpServer;

/// Default bind address; port 0 lets the OS pick.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:0";

/// Host configuration for a local MCP HTTP endpoint served under `/mcp`.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    server: ReplicateMcpServer,
}

impl McpHttpServer {
    pub fn new(bind_address: SocketAddr, server: ReplicateMcpServer) -> Self {
        Self { bind_address, server }
    }

    /// Binds the listener and serves in a background task.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let cancellation_token = CancellationToken::new();
        let server = self.server;
        let service: StreamableHttpService<ReplicateMcpServer, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(server.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address)
            .await
            .with_context(|| format!("failed to bind MCP HTTP server to {}", self.bind_address))?;
        let bound_address = listener.local_addr()?;

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                if let Err(error) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    warn!(%error, "MCP HTTP server stopped with an error");
                }
            }
        });

        info!(address = %bound_address, "MCP HTTP server listening on /mcp");
        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
        })
    }
}

/// Handle to a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

impl RunningMcpHttpServer {
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Stops accepting requests and waits for in-flight ones to drain.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.server_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP server task failed: {error}"))?;
        info!(address = %self.bind_address, "MCP HTTP server stopped");
        Ok(())
    }
}

/// Serves over HTTP until `shutdown` resolves.
pub async fn serve_http<F>(server: ReplicateMcpServer, bind_address: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let running = McpHttpServer::new(bind_address, server).start().await?;
    shutdown.await;
    running.stop().await
}

/// Parses a bind address and refuses anything but loopback.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr> {
    let address = bind_address.unwrap_or(DEFAULT_BIND_ADDRESS);
    let parsed: SocketAddr = address
        .parse()
        .map_err(|error| anyhow!("invalid MCP HTTP bind address '{address}': {error}"))?;
    if !is_loopback(parsed.ip()) {
        return Err(anyhow!("MCP HTTP server must bind to a loopback address, got '{address}'"));
    }
    Ok(parsed)
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}
