use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use replicate_mcp_api::{ApiConfig, ReplicateClient};
use replicate_mcp_registry::TemplateRegistry;
use replicate_mcp_server::config::{ServerConfig, Transport, config_json_schema, load_config, load_config_from_path, validate_config};
use replicate_mcp_server::server::{resolve_bind_address, serve_http, serve_stdio};
use replicate_mcp_server::{ToolRegistry, build_server};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "replicate-mcp", version, about = "MCP tool server for the Replicate API")]
struct Cli {
    /// Replicate API token.
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Replicate API base URL.
    #[arg(long, env = "REPLICATE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS", global = true)]
    timeout_secs: Option<u64>,

    /// Config file; defaults to ~/.config/replicate-mcp/config.json.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the tools to an MCP host (the default).
    Serve {
        #[arg(long, value_enum)]
        transport: Option<Transport>,
        /// Loopback `host:port` for the HTTP transport.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print every tool with its input schema.
    Tools,
    /// Print every parameter template id and version.
    Templates,
    /// Print the effective settings, or the config file schema.
    Config {
        #[arg(long)]
        schema: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match &cli.command {
        None => serve(&cli, None, None).await,
        Some(Command::Serve { transport, bind }) => serve(&cli, *transport, bind.clone()).await,
        Some(Command::Tools) => print_tools(),
        Some(Command::Templates) => print_templates(),
        Some(Command::Config { schema: true }) => print_json(&config_json_schema()),
        Some(Command::Config { schema: false }) => {
            let settings = resolve_settings(&cli, None, None)?;
            print_json(&serde_json::to_value(settings)?)
        }
    }
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Layers flags over the config file.
fn resolve_settings(cli: &Cli, transport: Option<Transport>, bind: Option<String>) -> Result<ServerConfig> {
    let file = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
    .context("failed to load config file")?;

    let flags = ServerConfig {
        api_base: cli.api_base.clone().filter(|base| !base.trim().is_empty()),
        timeout_seconds: cli.timeout_secs,
        transport,
        bind_address: bind,
    };
    let settings = file.merged_with(flags);
    validate_config(&settings).context("invalid settings")?;
    Ok(settings)
}

fn api_config(cli: &Cli, settings: &ServerConfig) -> Result<ApiConfig> {
    let mut config = ApiConfig::new(cli.api_token.clone());
    if let Some(base) = settings.api_base.as_deref() {
        config = config.with_base_url(base).context("invalid API base URL")?;
    }
    if let Some(timeout) = settings.timeout() {
        config = config.with_timeout(timeout);
    }
    Ok(config)
}

async fn serve(cli: &Cli, transport: Option<Transport>, bind: Option<String>) -> Result<()> {
    let settings = resolve_settings(cli, transport, bind)?;
    let client = ReplicateClient::new(api_config(cli, &settings)?).context("failed to build Replicate client")?;
    let server = build_server(Arc::new(client)).context("failed to assemble template registry")?;

    match settings.transport.unwrap_or_default() {
        Transport::Stdio => serve_stdio(server).await,
        Transport::Http => {
            let address = resolve_bind_address(settings.bind_address.as_deref())?;
            serve_http(server, address, async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("received Ctrl-C; shutting down");
                }
            })
            .await
        }
    }
}

fn print_tools() -> Result<()> {
    let tools: Vec<_> = ToolRegistry::builtin()
        .descriptors()
        .map(|descriptor| {
            json!({
                "name": descriptor.name,
                "description": descriptor.description,
                "inputSchema": descriptor.input_schema.to_json_schema(),
            })
        })
        .collect();
    print_json(&json!(tools))
}

fn print_templates() -> Result<()> {
    let registry = TemplateRegistry::builtin().context("failed to assemble template registry")?;
    for template in registry.templates() {
        println!("{}\t{}\t{}", template.id, template.version, template.name);
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
