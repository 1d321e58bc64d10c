//! Data Platform MCP Server
//!
//! Standalone MCP (Model Context Protocol) server speaking JSON-RPC 2.0 over
//! stdin/stdout. stdout carries protocol traffic only; logs and banners go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin data-platform-mcp
//!
//! # Reject oversized loads and search a project directory for relative paths
//! DATA_PLATFORM_ROW_LIMIT_POLICY=reject \
//! DATA_PLATFORM_PROJECT_DIRS=/data/project \
//!   cargo run --bin data-platform-mcp
//! ```
//!
//! # Configuration
//!
//! Read from `DATA_PLATFORM_CONFIG` (or the per-user config file) and then
//! overridden by `DATA_PLATFORM_*` environment variables. Log verbosity
//! follows `RUST_LOG`, defaulting to `data_platform_core=info`.

use data_platform_core::config::DataPlatformConfig;
use data_platform_core::services::McpServerService;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("data_platform_core=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    eprintln!("🔧 Initializing data-platform-mcp...");

    let config = match DataPlatformConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {}", e);
            eprintln!("❌ Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    eprintln!("🚀 Starting MCP server...");
    eprintln!("   Transport: stdio");
    eprintln!("   Row limit: {} ({:?})", config.max_rows, config.row_limit_policy);
    eprintln!("   I/O timeout: {}s", config.io_timeout_secs);

    // Blocks until stdin closes
    McpServerService::from_config(config).start().await
}
