//! Stdio gateway that exposes the pantry tools to an MCP client.

pub mod cli;
pub mod jsonrpc;
pub mod mcp;

use pantry::pantry_core::ToolError;
use pantry::Pantry;
use tokio::io::BufReader;
use tracing::info;

pub use cli::Cli;
pub use mcp::{serve, McpServer};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to set up tools: {0}")]
    Setup(#[from] ToolError),
    #[error("stdio transport failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Connects every backend and serves MCP over stdin/stdout until EOF.
pub async fn run(cli: Cli) -> Result<(), GatewayError> {
    let pantry = Pantry::connect(cli.pantry_config()).await?;
    info!(tools = pantry.registry().len(), "pantry gateway ready on stdio");

    let server = McpServer::from_pantry(pantry);
    serve(
        &server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}
