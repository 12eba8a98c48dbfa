//! Launching `ansible-playbook`.
//!
//! A validated configuration runs in exactly one [`ExecutionMode`]. Local and
//! virtualenv runs check the inventory first and then start
//! `ansible-playbook` directly; container runs hand the whole configuration
//! to the launcher inside the image.

use crate::config::PlaybookConfig;
use crate::container::{ContainerExecutor, CONTAINER_ENTRYPOINT};
use crate::env::ExecutionContext;
use crate::error::{Error, Result};
use crate::inventory::InventoryGrapher;
use crate::runner::{CommandRunner, RunOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where `ansible-playbook` runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Tools found on the context `PATH`
    Local,
    /// Tools found in `<venv>/bin` first
    VirtualEnv(PathBuf),
    /// Everything runs inside this image
    Container(String),
}

impl ExecutionMode {
    /// Pick the mode for a validated configuration.
    pub fn from_config(config: &PlaybookConfig) -> Result<Self> {
        match (config.virtual_env_path.is_empty(), config.image.is_empty()) {
            (true, true) => Ok(ExecutionMode::Local),
            (false, true) => Ok(ExecutionMode::VirtualEnv(PathBuf::from(
                &config.virtual_env_path,
            ))),
            (true, false) => Ok(ExecutionMode::Container(config.image.clone())),
            (false, false) => Err(Error::input(
                "python_path and container_image are mutually exclusive \
                 (only specify one or set execution-type to container or venv)",
            )),
        }
    }
}

/// `ansible-playbook` arguments for `config`.
pub fn build_playbook_args(config: &PlaybookConfig) -> Vec<String> {
    let mut args = Vec::new();

    if config.verbose_level > 0 {
        let count = config.verbose_level.min(7) as usize;
        args.push(format!("-{}", "v".repeat(count)));
    }

    args.push("-i".to_string());
    args.push(config.inventory_file.clone());
    args.push(config.playbook.clone());

    if !config.limit_host.is_empty() {
        args.push("--limit".to_string());
        args.push(config.limit_host.clone());
    }

    if !config.ansible_tags.is_empty() {
        args.push("--tags".to_string());
        args.push(config.ansible_tags.clone());
    }

    if !config.ansible_skip_tags.is_empty() {
        args.push("--skip-tags".to_string());
        args.push(config.ansible_skip_tags.clone());
    }

    if !config.extra_vars_file.is_empty() {
        args.push("--extra-vars".to_string());
        args.push(format!("@{}", config.extra_vars_file));
    }

    args.extend(config.extra_args.split_whitespace().map(String::from));
    args
}

/// Runs playbooks (and lint, see [`crate::lint`]) for validated configurations.
#[derive(Debug, Clone)]
pub struct PlaybookRunner {
    context: ExecutionContext,
}

impl PlaybookRunner {
    /// Create a runner over a projected execution context.
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Context for the Ansible tools: virtualenv on `PATH` plus the
    /// `ANSIBLE_*` variables derived from the configuration.
    pub fn tool_context(&self, config: &PlaybookConfig) -> Result<ExecutionContext> {
        let mut ctx = self.context.clone();
        if !config.virtual_env_path.is_empty() {
            ctx.prepend_path(Path::new(&config.virtual_env_path).join("bin"))?;
        }
        if !config.ssh_private_key_file.is_empty() {
            ctx.set("ANSIBLE_PRIVATE_KEY_FILE", &config.ssh_private_key_file);
        }
        if !config.remote_user.is_empty() {
            ctx.set("ANSIBLE_REMOTE_USER", &config.remote_user);
        }
        // Pipes are not terminals, keep Ansible's colors anyway.
        ctx.set("ANSIBLE_FORCE_COLOR", "True");
        Ok(ctx)
    }

    /// Run the playbook and return its exit code.
    ///
    /// The exit code is also stored in `config.metrics`. An invalid inventory
    /// aborts the run before `ansible-playbook` starts.
    pub async fn run(&self, config: &mut PlaybookConfig) -> Result<i32> {
        let mode = ExecutionMode::from_config(config)?;

        if let ExecutionMode::Container(image) = &mode {
            info!("Running playbook in container image {}", image);
            let output = ContainerExecutor::new(self.context.clone())
                .run(config, CONTAINER_ENTRYPOINT, &[], RunOptions::new())
                .await?;
            info!("Finished container run: rc={}", output.exit_code);
            config.metrics.exit_code = output.exit_code;
            return Ok(output.exit_code);
        }

        if let ExecutionMode::VirtualEnv(venv) = &mode {
            info!("Using virtualenv {} for ansible-playbook", venv.display());
        }

        let ctx = self.tool_context(config)?;
        let program = ctx.lookup("ansible-playbook")?;

        InventoryGrapher::new(self.context.clone())
            .validate(config)
            .await?;

        let args = build_playbook_args(config);
        let output = CommandRunner::new(ctx)
            .with_options(RunOptions::new().with_timeout_secs(config.playbook_timeout))
            .run(&program, &args)
            .await?;

        config.metrics.exit_code = output.exit_code;
        Ok(output.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> PlaybookConfig {
        PlaybookConfig {
            playbook: "./site.yml".to_string(),
            inventory_file: "./hosts".to_string(),
            ..PlaybookConfig::default()
        }
    }

    #[test]
    fn test_execution_mode() {
        let mut c = config();
        assert_eq!(ExecutionMode::from_config(&c).unwrap(), ExecutionMode::Local);

        c.virtual_env_path = "/opt/venv".to_string();
        assert_eq!(
            ExecutionMode::from_config(&c).unwrap(),
            ExecutionMode::VirtualEnv(PathBuf::from("/opt/venv"))
        );

        c.image = "ansible:latest".to_string();
        assert!(ExecutionMode::from_config(&c).unwrap_err().is_input());

        c.virtual_env_path.clear();
        assert_eq!(
            ExecutionMode::from_config(&c).unwrap(),
            ExecutionMode::Container("ansible:latest".to_string())
        );
    }

    #[test]
    fn test_minimal_args() {
        let mut c = config();
        c.verbose_level = 0;
        assert_eq!(build_playbook_args(&c), vec!["-i", "./hosts", "./site.yml"]);
    }

    #[test]
    fn test_full_args() {
        let mut c = config();
        c.verbose_level = 3;
        c.limit_host = "web*".to_string();
        c.ansible_tags = "deploy,config".to_string();
        c.ansible_skip_tags = "slow".to_string();
        c.extra_vars_file = "./vars.yml".to_string();
        c.extra_args = "  --diff   --check ".to_string();

        assert_eq!(
            build_playbook_args(&c),
            vec![
                "-vvv",
                "-i",
                "./hosts",
                "./site.yml",
                "--limit",
                "web*",
                "--tags",
                "deploy,config",
                "--skip-tags",
                "slow",
                "--extra-vars",
                "@./vars.yml",
                "--diff",
                "--check",
            ]
        );
    }

    #[test]
    fn test_tool_context() {
        let mut base = ExecutionContext::new();
        base.set("PATH", "/usr/bin");
        let runner = PlaybookRunner::new(base);

        let mut c = config();
        c.virtual_env_path = "/opt/venv".to_string();
        c.ssh_private_key_file = "/home/me/.ssh/id_rsa".to_string();
        c.remote_user = "deploy".to_string();

        let ctx = runner.tool_context(&c).unwrap();
        assert_eq!(ctx.get("PATH"), Some("/opt/venv/bin:/usr/bin"));
        assert_eq!(ctx.get("ANSIBLE_PRIVATE_KEY_FILE"), Some("/home/me/.ssh/id_rsa"));
        assert_eq!(ctx.get("ANSIBLE_REMOTE_USER"), Some("deploy"));
        assert_eq!(ctx.get("ANSIBLE_FORCE_COLOR"), Some("True"));
        assert_eq!(runner.context().get("ANSIBLE_FORCE_COLOR"), None);
    }
}
