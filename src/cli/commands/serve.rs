//! Serve command - accept playbook requests over HTTP.

use super::{CommandContext, Runnable};
use ansible_shim::api::{shutdown_signal, ApiConfig, ApiServer};
use anyhow::{Context, Result};
use tracing::info;

/// Runs the HTTP API until a termination signal arrives.
#[derive(Debug, Clone)]
pub struct ServeCommand {
    pub http_addr: String,
}

impl ServeCommand {
    pub fn new(http_addr: impl Into<String>) -> Self {
        Self {
            http_addr: http_addr.into(),
        }
    }

    /// Execute the serve command
    pub async fn execute(&self, _ctx: &mut CommandContext) -> Result<i32> {
        let config = ApiConfig::from_http_addr(&self.http_addr)?;
        ApiServer::new(config)
            .run_with_shutdown(shutdown_signal())
            .await
            .with_context(|| format!("HTTP server on {} failed", self.http_addr))?;
        info!("HTTP server stopped");
        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for ServeCommand {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
