//! REST API server for the champion catalogue.
//!
//! Loads the JSON store, builds the router and serves HTTP until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use champions_api::{
    router::{AppState, Router},
    server::Server,
};
use champions_core::{config::DbConfig, Database};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the champion server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3333)]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// JSON file holding the store
    #[arg(long, env = "DATA_FILE", default_value = "./db.json")]
    data_file: PathBuf,

    /// Request body timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DbConfig {
        data_file: args.data_file.clone(),
        request_timeout_ms: args.request_timeout_ms,
        ..Default::default()
    };

    let db = Database::open(&config)
        .with_context(|| format!("Failed to open store {}", args.data_file.display()))?;
    let router = Router::new(AppState::new(db, config)).context("Failed to build router")?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    tracing::info!(
        "Starting champion server on {} with store {}",
        addr,
        args.data_file.display()
    );

    let mut server_handle = tokio::spawn(server.serve());

    tokio::select! {
        result = &mut server_handle => {
            result
                .context("Server task panicked")?
                .context("Server failed")?;
        }
        result = signal::ctrl_c() => {
            result.context("Failed to listen for ctrl_c")?;
            tracing::info!("Shutting down server...");
            server_handle.abort();
        }
    }

    Ok(())
}
