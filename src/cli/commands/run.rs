//! Run command - launch the configured playbook once.

use super::{CommandContext, Runnable};
use ansible_shim::playbook::PlaybookRunner;
use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

/// Runs `ansible-playbook` for the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct RunCommand;

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (mut config, context) = ctx.prepare()?;
        let start = Instant::now();

        let rc = PlaybookRunner::new(context).run(&mut config).await?;

        let elapsed = start.elapsed();
        if rc == 0 {
            info!(
                hosts = config.metrics.inventory_count,
                "Playbook finished in {:.1}s",
                elapsed.as_secs_f64()
            );
        } else {
            warn!(
                rc,
                hosts = config.metrics.inventory_count,
                "Playbook failed after {:.1}s",
                elapsed.as_secs_f64()
            );
        }
        Ok(rc)
    }
}

#[async_trait::async_trait]
impl Runnable for RunCommand {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
