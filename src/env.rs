//! Environment projection for spawned processes.
//!
//! Child processes never inherit the launcher's environment directly. An
//! [`ExecutionContext`] is built once from the configuration's projection
//! policy and applied to every command with `env_clear`, so concurrent runs
//! in one process cannot see each other's variables.

use crate::config::PlaybookConfig;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Variables every child process keeps from the launching environment.
pub const INHERITED_VARS: &[&str] = &["PATH", "HOME"];

/// The exact environment a child process is started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    vars: BTreeMap<String, String>,
}

impl ExecutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Project the configuration's policy against the process environment.
    pub fn project(config: &PlaybookConfig) -> Result<Self> {
        Self::project_from(config, |key| std::env::var(key).ok())
    }

    /// Project the configuration's policy against an arbitrary variable source.
    ///
    /// Result: inherited `PATH`/`HOME`, then every `pass` name with a
    /// non-empty value, then every `set` entry (which wins on collision).
    pub fn project_from<F>(config: &PlaybookConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ctx = Self::new();

        for name in INHERITED_VARS {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                ctx.vars.insert(name.to_string(), value);
            }
        }

        let policy = &config.environment_variables;
        let mut passed = BTreeMap::new();
        for name in &policy.pass {
            validate_name(name)?;
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => {
                    debug!(name = %name, "Passing through environment variable");
                    passed.insert(name.clone(), value);
                }
                None => warn!(
                    "Environment variable {} is empty or unset and will not be passed through",
                    name
                ),
            }
        }

        for (name, value) in &policy.set {
            validate_name(name)?;
            if passed.remove(name).is_some() {
                warn!(
                    "Environment variable {} is in both pass and set lists; using the set value",
                    name
                );
            }
            ctx.vars.insert(name.clone(), value.clone());
        }

        for (name, value) in passed {
            ctx.vars.insert(name, value);
        }

        Ok(ctx)
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Iterate over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Variables that are neither inherited nor set by the launcher itself.
    pub fn projected(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter(|(k, _)| !INHERITED_VARS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Prepend a directory to `PATH`.
    pub fn prepend_path(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let mut paths = vec![dir.as_ref().to_path_buf()];
        if let Some(current) = self.get("PATH") {
            paths.extend(std::env::split_paths(current));
        }
        let joined: OsString = std::env::join_paths(paths)
            .map_err(|e| Error::input(format!("invalid PATH entry: {}", e)))?;
        self.set("PATH", joined.to_string_lossy());
        Ok(())
    }

    /// Find `program` on this context's `PATH`.
    pub fn lookup(&self, program: &str) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        let found = which::which_in(program, self.get("PATH"), cwd)
            .map_err(|e| Error::program_not_found(program, e))?;
        debug!("{} lookup path: {}", program, found.display());
        Ok(found)
    }

    /// Replace a command's environment with this context.
    pub fn apply(&self, command: &mut tokio::process::Command) {
        command.env_clear().envs(self.iter());
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(Error::input(format!(
            "invalid environment variable name '{}'",
            name
        )));
    }
    Ok(())
}
