//! Running `ansible-lint` against the configured playbook or the whole tree.

use crate::config::{GlobalConfig, PlaybookConfig};
use crate::container::{ContainerExecutor, CONTAINER_ENTRYPOINT};
use crate::error::Result;
use crate::playbook::PlaybookRunner;
use crate::runner::{CommandRunner, RunOptions};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lint rules file picked up from the working directory.
pub const LINT_RULES_FILE: &str = ".ansible-lint";

/// What to lint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintTarget {
    /// Only the configured playbook
    Playbook,
    /// Everything under the working directory
    All,
}

impl LintTarget {
    /// Flag that selects this target on the launcher's command line.
    pub fn flag(&self) -> &'static str {
        match self {
            LintTarget::Playbook => "--lp",
            LintTarget::All => "--la",
        }
    }
}

/// `ansible-lint` arguments. `-c` is added when a rules file exists.
pub fn build_lint_args(config: &PlaybookConfig, target: LintTarget, rules_present: bool) -> Vec<String> {
    let mut args = vec!["-v".to_string(), "-p".to_string()];
    if rules_present {
        args.push("-c".to_string());
        args.push(LINT_RULES_FILE.to_string());
    }
    if target == LintTarget::Playbook {
        args.push(config.playbook.clone());
    }
    args
}

/// Copy the enforced rules file to `dest`, if the global config forces one.
///
/// Returns true when a file was copied.
pub fn install_forced_rules(global: Option<&GlobalConfig>, dest: &Path) -> bool {
    let Some(source) = global
        .map(|g| g.force.ansible_lint_file_path.as_str())
        .filter(|p| !p.is_empty())
    else {
        return false;
    };

    if !Path::new(source).is_file() {
        warn!("Forced ansible-lint file {} does not exist", source);
        return false;
    }
    match fs::copy(source, dest) {
        Ok(_) => {
            debug!("Copied {} to {}", source, dest.display());
            true
        }
        Err(e) => {
            warn!("Could not copy {} to {}: {}", source, dest.display(), e);
            false
        }
    }
}

impl PlaybookRunner {
    /// Run `ansible-lint` and return its exit code.
    pub async fn run_lint(&self, config: &PlaybookConfig, target: LintTarget) -> Result<i32> {
        debug!("Starting lint run");
        install_forced_rules(GlobalConfig::load_system().as_ref(), Path::new(LINT_RULES_FILE));

        if !config.image.is_empty() {
            let output = ContainerExecutor::new(self.context().clone())
                .run(
                    config,
                    CONTAINER_ENTRYPOINT,
                    &[target.flag().to_string()],
                    RunOptions::new(),
                )
                .await?;
            info!("Finished lint in container: rc={}", output.exit_code);
            return Ok(output.exit_code);
        }

        let ctx = self.tool_context(config)?;
        let program = ctx.lookup("ansible-lint")?;
        let args = build_lint_args(config, target, Path::new(LINT_RULES_FILE).is_file());

        let output = CommandRunner::new(ctx)
            .with_options(RunOptions::new().with_timeout_secs(config.playbook_timeout))
            .run(&program, &args)
            .await?;
        Ok(output.exit_code)
    }
}
