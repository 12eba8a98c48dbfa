//! Commands for the ansible-shim CLI
//!
//! Each command returns the process exit code. Setup failures are returned
//! as errors and reported by `main`.

pub mod generate;
pub mod lint;
pub mod run;
#[cfg(feature = "api")]
pub mod serve;

use ansible_shim::config::{PlaybookConfig, DEFAULT_CONFIG_FILE};
use ansible_shim::env::ExecutionContext;
use ansible_shim::validate::validate_inputs;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Common context shared between commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Configuration file given on the command line or through `PB_CONFIG_FILE`
    pub config_path: Option<PathBuf>,
    /// Verbosity from the command line
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli) -> Self {
        if cli.no_tui {
            debug!("--nt given, running non-interactively");
        }
        Self {
            config_path: cli.config.clone(),
            verbosity: cli.verbosity(),
        }
    }

    /// The configuration file to read, if any.
    ///
    /// Without `-c` the default path is used when it exists.
    pub fn config_file(&self) -> Option<PathBuf> {
        match &self.config_path {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        }
    }

    /// Load, validate and project the configuration for a run.
    pub fn prepare(&self) -> Result<(PlaybookConfig, ExecutionContext)> {
        let path = self.config_file();
        let mut config = PlaybookConfig::load(path.as_deref())
            .with_context(|| config_error_context(path.as_deref()))?;
        validate_inputs(&mut config).context("Invalid configuration")?;
        let context = ExecutionContext::project(&config)
            .context("Invalid environment-variables configuration")?;
        Ok((config, context))
    }
}

fn config_error_context(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("Could not load configuration from {}", path.display()),
        None => "Could not load configuration from the environment".to_string(),
    }
}

/// Trait for runnable commands
#[async_trait::async_trait]
pub trait Runnable {
    /// Execute the command
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}
