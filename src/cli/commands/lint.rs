//! Lint command - run ansible-lint instead of the playbook.

use super::{CommandContext, Runnable};
use ansible_shim::lint::LintTarget;
use ansible_shim::playbook::PlaybookRunner;
use anyhow::Result;
use tracing::info;

/// Runs `ansible-lint` for the loaded configuration.
#[derive(Debug, Clone)]
pub struct LintCommand {
    pub target: LintTarget,
}

impl LintCommand {
    pub fn new(target: LintTarget) -> Self {
        Self { target }
    }

    /// Execute the lint command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (config, context) = ctx.prepare()?;
        let rc = PlaybookRunner::new(context)
            .run_lint(&config, self.target)
            .await?;
        info!("ansible-lint finished: rc={}", rc);
        Ok(rc)
    }
}

#[async_trait::async_trait]
impl Runnable for LintCommand {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
