//! Serve command - run the MCP server over stdio.

use super::{get_database, load_config, query_service};
use anyhow::{Context, Result};
use lore_mcp::{McpServer, QueryEmbedder};
use tokio::runtime::Runtime;
use tracing::{info, warn};

pub fn run() -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;
    let query = query_service(&config, db);

    let mut server = McpServer::new(query, config.server.name.clone());
    match QueryEmbedder::from_config(&config) {
        Ok(embedder) => server = server.with_embedder(embedder),
        Err(e) => warn!("Semantic search disabled: {}", e),
    }

    let rt = Runtime::new().context("Failed to create async runtime")?;

    info!("Serving '{}' over stdio", config.server.name);
    rt.block_on(server.serve_stdio()).context("MCP server failed")?;
    info!("Client disconnected, shutting down");

    Ok(())
}
