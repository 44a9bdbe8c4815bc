//! shellkeep server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellkeep_client::{CacheAgent, FetchClient, FetchConfig, Manifest};
use shellkeep_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin_url()?;

    tracing::info!(
        origin = %origin,
        db_path = %config.db_path.display(),
        "Starting shellkeep server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let agent = Arc::new(CacheAgent::new(Manifest::default(), origin, Arc::new(db), Arc::new(fetcher))?);

    if config.auto_register {
        match agent.register().await {
            Ok(report) => tracing::info!(cache = %report.cache_name, deleted = ?report.deleted, "registered"),
            Err(err) => tracing::error!(error = %err, "registration failed; requests pass through uncached"),
        }
    }

    let handler = handler::ShellkeepServer::new(Arc::clone(&agent));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    agent.settle().await;

    Ok(())
}
