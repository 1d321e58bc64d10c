//! MCP Server Service
//!
//! Managed service wrapper for the MCP stdio server. Builds the shared
//! [`DataService`] from configuration and serves it until stdin closes.
//!
//! # Example
//!
//! ```ignore
//! let config = DataPlatformConfig::load()?;
//! McpServerService::from_config(config).start().await?;
//! ```

use crate::config::DataPlatformConfig;
use crate::mcp;
use crate::services::DataService;
use std::sync::Arc;
use tracing::info;

/// MCP Server Service
///
/// `Clone` and `Arc`-backed, so one instance can be shared with other tasks
/// that need the same registry.
#[derive(Debug, Clone)]
pub struct McpServerService {
    data_service: Arc<DataService>,
}

impl McpServerService {
    pub fn new(data_service: Arc<DataService>) -> Self {
        Self { data_service }
    }

    pub fn from_config(config: DataPlatformConfig) -> Self {
        Self::new(Arc::new(DataService::from_config(config)))
    }

    pub fn data_service(&self) -> &Arc<DataService> {
        &self.data_service
    }

    /// Serve JSON-RPC over stdin/stdout.
    ///
    /// Returns `Ok(())` once stdin is closed and every in-flight request has
    /// been answered.
    pub async fn start(&self) -> anyhow::Result<()> {
        let config = self.data_service.config();
        info!(
            "Starting MCP stdio server (max_rows={}, policy={:?}, project_dirs={})",
            config.max_rows,
            config.row_limit_policy,
            config.project_dirs.len()
        );
        mcp::run_mcp_server(self.data_service.clone()).await
    }
}
