//! Running the launcher inside a container image.
//!
//! The working directory is mounted at `/app` and the resolved configuration
//! is written to the temp directory inside it, so the containerized launcher
//! reads the same playbook and inventory paths through `PB_CONFIG_FILE`.

use crate::config::{write_private_file, PlaybookConfig};
use crate::env::ExecutionContext;
use crate::error::{Error, Result};
use crate::runner::{CommandOutput, CommandRunner, RunOptions};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Mount point of the working directory inside the container.
pub const CONTAINER_WORKDIR: &str = "/app";

/// Mount point of the SSH private key inside the container.
pub const CONTAINER_SSH_KEY_PATH: &str = "/app/.ssh/ansible-tui";

/// Launcher binary shipped in compatible images.
pub const CONTAINER_ENTRYPOINT: &str = "/bin/ansible-tui";

/// Supported container runtimes, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Podman,
    Docker,
}

impl ContainerRuntime {
    /// Executable name.
    pub fn program(&self) -> &'static str {
        match self {
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Docker => "docker",
        }
    }

    /// Find a runtime on the context's `PATH`, preferring podman.
    pub fn detect(ctx: &ExecutionContext) -> Result<Self> {
        for runtime in [ContainerRuntime::Podman, ContainerRuntime::Docker] {
            if ctx.lookup(runtime.program()).is_ok() {
                debug!("found {}", runtime);
                return Ok(runtime);
            }
        }
        Err(Error::NoContainerRuntime)
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Builds and runs container invocations for a configuration.
#[derive(Debug, Clone)]
pub struct ContainerExecutor {
    context: ExecutionContext,
}

impl ContainerExecutor {
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// The configuration as the containerized launcher should see it, plus
    /// the host path of the SSH key to mount (symlinks resolved).
    ///
    /// The image is cleared so the inner launcher runs locally, the key path
    /// is rewritten to its mount point, and projected variables are folded
    /// into `environment-variables.set`.
    pub fn container_config(&self, config: &PlaybookConfig) -> Result<(PlaybookConfig, Option<PathBuf>)> {
        let mut inner = config.clone();
        inner.image.clear();
        inner.execution_type = None;

        let key_mount = if config.ssh_private_key_file.is_empty() {
            None
        } else {
            let resolved = fs::canonicalize(&config.ssh_private_key_file).map_err(|e| {
                Error::invalid_path(
                    config.ssh_private_key_file.clone(),
                    format!("could not resolve SSH private key ({})", e),
                )
            })?;
            inner.ssh_private_key_file = CONTAINER_SSH_KEY_PATH.to_string();
            Some(resolved)
        };

        inner.environment_variables.pass.clear();
        for (name, value) in self.context.projected() {
            inner.environment_variables.set.insert(name, value);
        }

        Ok((inner, key_mount))
    }

    /// Arguments for `<runtime> run ...`.
    pub fn build_args(
        &self,
        config: &PlaybookConfig,
        cwd: &Path,
        key_mount: Option<&Path>,
        command: &str,
        args: &[String],
    ) -> Result<Vec<String>> {
        let inner_config = container_path(&config.container_config_path(), cwd)?;

        let mut run_args: Vec<String> = vec![
            "run".into(),
            "--rm".into(),
            "-u".into(),
            "root".into(),
            "-e".into(),
            format!("PB_CONFIG_FILE={}", inner_config),
            "-e".into(),
            "NO_TUI=true".into(),
            "-v".into(),
            format!("{}:{}:rw,z", cwd.display(), CONTAINER_WORKDIR),
        ];

        if let Some(key) = key_mount {
            run_args.push("-v".into());
            run_args.push(format!("{}:{}:ro", key.display(), CONTAINER_SSH_KEY_PATH));
        }

        run_args.push(config.image.clone());
        run_args.push(command.to_string());
        run_args.extend(args.iter().cloned());
        Ok(run_args)
    }

    /// Run `command` with `args` inside `config.image`.
    ///
    /// The container's own lifetime includes pulling the image, so the run
    /// is never given a deadline regardless of `options`.
    pub async fn run(
        &self,
        config: &PlaybookConfig,
        command: &str,
        args: &[String],
        options: RunOptions,
    ) -> Result<CommandOutput> {
        if config.image.is_empty() {
            return Err(Error::input("no container image configured"));
        }
        let runtime = ContainerRuntime::detect(&self.context)?;
        let program = self.context.lookup(runtime.program())?;
        let cwd = std::env::current_dir()?;

        let (inner, key_mount) = self.container_config(config)?;
        let config_path = config.container_config_path();
        write_private_file(&config_path, &inner.to_yaml()?)?;
        debug!(path = %config_path, "Wrote container configuration");

        let run_args = self.build_args(config, &cwd, key_mount.as_deref(), command, args)?;
        info!("Running {} in {} image {}", command, runtime, config.image);

        let options = RunOptions {
            timeout: None,
            ..options
        };
        CommandRunner::new(self.context.clone())
            .with_options(options)
            .run(&program, &run_args)
            .await
    }
}

/// Translate a host path under `cwd` to its location under [`CONTAINER_WORKDIR`].
pub fn container_path(host_path: &str, cwd: &Path) -> Result<String> {
    let path = Path::new(host_path);
    let relative = if path.is_absolute() {
        path.strip_prefix(cwd).map_err(|_| {
            Error::invalid_path(
                host_path,
                "path must be inside the working directory to be visible in the container",
            )
        })?
    } else {
        path.strip_prefix("./").unwrap_or(path)
    };
    Ok(format!(
        "{}/{}",
        CONTAINER_WORKDIR,
        relative.display()
    ))
}
