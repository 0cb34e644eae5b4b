//! graph-mcp: MCP server exposing Intune, Entra directory and security data.
//!
//! The server speaks JSON-RPC 2.0 over stdio. Logs go to stderr.

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use graph::{ClientCredentials, GraphApi, GraphClient, Query};
use tools::{Catalogue, Dispatcher};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "graph-mcp.toml";

#[derive(Parser)]
#[command(name = "graph-mcp")]
#[command(about = "MCP server for Microsoft Graph device, directory and security data", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,
    /// Print the tool catalogue as JSON
    Tools,
    /// Acquire a token and fetch the organization to test connectivity
    Check,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?.with_env();
    init_logging(&config.log.level)?;

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(&config).await,
        Some(Commands::Tools) => cmd_tools(),
        Some(Commands::Check) => cmd_check(&config).await,
    }
}

/// Log to stderr; stdout carries the protocol. `RUST_LOG` wins over the config.
fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| Error::LogLevel {
            level: level.to_string(),
            message: e.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn connect(config: &Config) -> Result<GraphClient<ClientCredentials>> {
    let tokens = ClientCredentials::with_timeout(config.credentials()?, config.graph.timeout())?;
    let client = GraphClient::builder(tokens)
        .base_url(&config.graph.base_url)
        .timeout(config.graph.timeout())
        .max_pages(config.graph.max_pages)
        .build()?;
    Ok(client)
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let client = connect(config)?;
    let dispatcher = Dispatcher::new(Arc::new(client));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.graph.base_url,
        tools = dispatcher.list_tools().len(),
        "starting graph-mcp server"
    );

    mcp::Server::new(dispatcher).serve_stdio().await?;
    Ok(())
}

fn cmd_tools() -> Result<()> {
    let tools = Catalogue::standard().to_mcp();
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

async fn cmd_check(config: &Config) -> Result<()> {
    let client = connect(config)?;

    let organizations = client.list("/organization", &Query::new().top(1)).await?;
    let name = organizations
        .first()
        .and_then(|org| org.get("displayName"))
        .and_then(|name| name.as_str())
        .unwrap_or("(unnamed)");

    println!("Connected to tenant: {name}");
    println!("Graph endpoint: {}", config.graph.base_url);
    Ok(())
}
