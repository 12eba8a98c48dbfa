//! Generate command - write a starter configuration file.

use super::{CommandContext, Runnable};
use ansible_shim::config::{GlobalConfig, PlaybookConfig, DEFAULT_CONFIG_FILE};
use ansible_shim::template::generate_template_file;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Writes the template to the configuration path.
#[derive(Debug, Clone, Default)]
pub struct GenerateCommand;

impl GenerateCommand {
    /// Execute the generate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let path = ctx
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        // The environment may supply the remote user, image and temp directory.
        let mut config = PlaybookConfig::new();
        config
            .apply_env()
            .context("Could not read environment variables")?;

        generate_template_file(&config, &path, GlobalConfig::load_system().as_ref())
            .with_context(|| format!("Could not write {}", path.display()))?;
        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for GenerateCommand {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
