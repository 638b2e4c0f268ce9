//! Strictly Chess server binary.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use strictly_chess_server::cli::{Cli, Command};
use strictly_chess_server::{ServerConfig, serve};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_chess_server=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => run_server(host, port, config).await,
    }
}

/// Run the WebSocket game server
#[instrument(skip_all)]
async fn run_server(
    host: Option<String>,
    port: Option<u16>,
    config: Option<std::path::PathBuf>,
) -> Result<()> {
    let mut config = ServerConfig::load(config.as_deref())?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    info!(host = %config.host(), port = config.port(), "Starting Strictly Chess server");
    serve(config).await
}
