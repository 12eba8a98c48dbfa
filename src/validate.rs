//! Structural validation of a merged [`PlaybookConfig`].
//!
//! Validation stops at the first failure and normalizes the configuration in
//! place: `~` is expanded in virtualenv and SSH key paths, and both are
//! stored as absolute, symlink-resolved paths.

use crate::config::{ExecutionType, PlaybookConfig, DEFAULT_VERBOSE_LEVEL};
use crate::error::{Error, Result};
use crate::logging;
use crate::security::{is_dot_relative, path_exists, validate_path, PathKind};
use tracing::{debug, warn};

/// Highest verbosity `ansible-playbook` understands.
pub const MAX_VERBOSE_LEVEL: i64 = 7;

/// Validate against the process `HOME`.
pub fn validate_inputs(config: &mut PlaybookConfig) -> Result<()> {
    let home = std::env::var("HOME").ok();
    validate_inputs_with_home(config, home.as_deref())
}

/// Validate, expanding `~` against `home`.
pub fn validate_inputs_with_home(config: &mut PlaybookConfig, home: Option<&str>) -> Result<()> {
    if !(0..=MAX_VERBOSE_LEVEL).contains(&config.verbose_level) {
        warn!("VERBOSE_LEVEL must be between 0 and 7, using default (1).");
        config.verbose_level = DEFAULT_VERBOSE_LEVEL;
    }
    logging::set_verbosity(config.verbose_level);

    if config.playbook.is_empty() {
        return Err(Error::input("playbook is required"));
    }
    validate_input_file(config, &config.playbook, "playbook")?;

    if config.inventory_file.is_empty() {
        return Err(Error::input("inventory parameter is required"));
    }
    validate_input_file(config, &config.inventory_file, "inventory")?;

    if !config.extra_vars_file.is_empty() {
        validate_input_file(config, &config.extra_vars_file, "extra-vars file")?;
    }

    resolve_execution_mode(config)?;

    if !config.virtual_env_path.is_empty() {
        let expanded = expand_home(&config.virtual_env_path, home);
        let venv = validate_path(&expanded, PathKind::Directory)?;
        for tool in ["ansible-playbook", "ansible-inventory"] {
            let binary = venv.join("bin").join(tool);
            path_exists(&binary, PathKind::File).map_err(|_| {
                Error::invalid_path(
                    venv.display().to_string(),
                    format!("virtualenv does not contain bin/{}", tool),
                )
            })?;
        }
        debug!(venv = %venv.display(), "Validated virtualenv");
        config.virtual_env_path = venv.display().to_string();
    }

    if !config.ssh_private_key_file.is_empty() {
        let expanded = expand_home(&config.ssh_private_key_file, home);
        let key = validate_path(&expanded, PathKind::File)?;
        config.ssh_private_key_file = key.display().to_string();
    }

    Ok(())
}

/// Apply the `execution-type` override when both a virtualenv and an image are set.
fn resolve_execution_mode(config: &mut PlaybookConfig) -> Result<()> {
    if config.virtual_env_path.is_empty() || config.image.is_empty() {
        return Ok(());
    }
    match config.execution_type {
        Some(ExecutionType::Container) => {
            debug!("execution-type is container, ignoring virtual-env-path");
            config.virtual_env_path.clear();
            Ok(())
        }
        Some(ExecutionType::Venv) => {
            debug!("execution-type is venv, ignoring image");
            config.image.clear();
            Ok(())
        }
        None => Err(Error::input(
            "python_path and container_image are mutually exclusive \
             (only specify one or set execution-type to container or venv)",
        )),
    }
}

/// Whether `path` names a file the shim wrote into its own temp directory.
fn in_temp_dir(config: &PlaybookConfig, path: &str) -> bool {
    let dir = config.temp_dir_path.trim_end_matches('/');
    !dir.is_empty()
        && path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// User-supplied files must be relative to the working directory; files
/// under the temp directory may be absolute.
fn validate_input_file(config: &PlaybookConfig, path: &str, what: &str) -> Result<()> {
    if !in_temp_dir(config, path) && !is_dot_relative(path) {
        return Err(Error::invalid_path(
            path,
            format!("{} must have relative path to current directory", what),
        ));
    }
    validate_path(path, PathKind::File)?;
    Ok(())
}

fn expand_home(path: &str, home: Option<&str>) -> String {
    shellexpand::tilde_with_context(path, || home).into_owned()
}
