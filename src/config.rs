//! Configuration for a single playbook invocation.
//!
//! A [`PlaybookConfig`] is assembled from several sources, lowest precedence
//! first:
//! - Built-in defaults
//! - A YAML configuration file (`-c` / `PB_CONFIG_FILE`)
//! - Environment variables
//!
//! Inline inventory or extra-vars content supplied through the environment is
//! written to files under the temp directory and referenced by path.

use crate::error::{Error, Result};
use crate::security::ensure_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default working directory for generated files.
pub const DEFAULT_TEMP_DIR: &str = "./.ansible-tui";

/// Default configuration file path.
pub const DEFAULT_CONFIG_FILE: &str = "./.ansible-tui/config.yml";

/// System-wide defaults file.
pub const GLOBAL_CONFIG_PATH: &str = "/etc/ansible/ansible-tui-config.yml";

/// Default playbook timeout (one day).
pub const DEFAULT_PLAYBOOK_TIMEOUT: i64 = 86400;

/// Default verbosity level.
pub const DEFAULT_VERBOSE_LEVEL: i64 = 1;

/// File name used for `INVENTORY_CONTENTS`.
const INVENTORY_CONTENTS_FILE: &str = "hosts-INVENTORY";

/// File name used for `EXTRA_VARS_CONTENTS`.
const EXTRA_VARS_CONTENTS_FILE: &str = "PLAYBOOK-extravars";

/// Which execution mode wins when both a virtualenv and an image are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    /// Keep the container image, drop the virtualenv
    Container,
    /// Keep the virtualenv, drop the container image
    Venv,
}

/// Environment projection policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentVariables {
    /// Variables copied from the launching environment
    pub pass: Vec<String>,

    /// Variables forced to a fixed value
    pub set: BTreeMap<String, String>,
}

/// Settings consumed by the interactive front end. Carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TuiParams {
    pub playbook_dir: String,
    pub inventory_dir: String,
    pub image_filter: String,
    pub virtual_envs_dir: String,
}

/// Results recorded after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Exit code of the playbook (or container) process
    pub exit_code: i32,
    /// Last error, if the run failed before or during execution
    pub error: Option<String>,
    /// Distinct hosts reported by `ansible-inventory --graph`
    pub inventory_count: usize,
}

/// Everything needed to launch one `ansible-playbook` run.
///
/// String fields use the empty string for "not set", matching the YAML and
/// environment sources they come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlaybookConfig {
    pub playbook: String,
    pub verbose_level: i64,
    pub ssh_private_key_file: String,
    pub remote_user: String,
    #[serde(rename = "inventory")]
    pub inventory_file: String,
    #[serde(rename = "limit")]
    pub limit_host: String,
    pub extra_vars_file: String,
    #[serde(rename = "tags")]
    pub ansible_tags: String,
    #[serde(rename = "skip-tags")]
    pub ansible_skip_tags: String,
    pub extra_args: String,
    pub windows_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<ExecutionType>,
    pub image: String,
    pub virtual_env_path: String,

    /// Seconds; zero or negative means unlimited
    pub playbook_timeout: i64,

    pub environment_variables: EnvironmentVariables,
    pub tui: TuiParams,
    pub temp_dir_path: String,

    /// Path the configuration was loaded from
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,

    #[serde(skip)]
    pub metrics: Metrics,
}

impl Default for PlaybookConfig {
    fn default() -> Self {
        Self {
            playbook: String::new(),
            verbose_level: DEFAULT_VERBOSE_LEVEL,
            ssh_private_key_file: String::new(),
            remote_user: String::new(),
            inventory_file: String::new(),
            limit_host: String::new(),
            extra_vars_file: String::new(),
            ansible_tags: String::new(),
            ansible_skip_tags: String::new(),
            extra_args: String::new(),
            windows_group: String::new(),
            execution_type: None,
            image: String::new(),
            virtual_env_path: String::new(),
            playbook_timeout: DEFAULT_PLAYBOOK_TIMEOUT,
            environment_variables: EnvironmentVariables::default(),
            tui: TuiParams::default(),
            temp_dir_path: DEFAULT_TEMP_DIR.to_string(),
            config_file_path: None,
            metrics: Metrics::default(),
        }
    }
}

impl PlaybookConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration: defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::new();
        if let Some(path) = path {
            config.load_file(path)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Merge a YAML file into this configuration.
    ///
    /// An empty path is a no-op. Keys missing from the file keep their
    /// current values.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(());
        }

        debug!("Reading config file: {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        self.merge_yaml(overlay).map_err(|e| match e {
            Error::Yaml(source) => Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        self.config_file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Overlay a YAML document onto this configuration, recursing into nested mappings.
    pub fn merge_yaml(&mut self, overlay: serde_yaml::Value) -> Result<()> {
        if overlay.is_null() {
            return Ok(());
        }
        let mut base = serde_yaml::to_value(&*self)?;
        overlay_value(&mut base, overlay);

        let mut merged: PlaybookConfig = serde_yaml::from_value(base)?;
        merged.config_file_path = self.config_file_path.take();
        merged.metrics = std::mem::take(&mut self.metrics);
        *self = merged;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Each recognized variable overwrites its field when non-empty. The temp
    /// directory is created as a side effect, and `*_CONTENTS` variables are
    /// written to files inside it.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(playbook) = var("PLAYBOOK") {
            self.playbook = playbook;
        }

        if let Some(level) = var("VERBOSE_LEVEL") {
            match level.trim().parse() {
                Ok(n) => self.verbose_level = n,
                Err(e) => warn!(
                    "Could not parse VERBOSE_LEVEL '{}' ({}), keeping {}",
                    level, e, self.verbose_level
                ),
            }
        }

        if let Some(key_file) = var("SSH_PRIVATE_KEY_FILE") {
            self.ssh_private_key_file = key_file;
        }

        if let Some(user) = var("ANSIBLE_REMOTE_USER") {
            self.remote_user = user;
        }

        if let Some(dir) = var("TMP_DIR_PATH") {
            self.temp_dir_path = dir;
        }
        ensure_dir(&self.temp_dir_path)?;

        // Inventory: exactly one source
        let inventory_file = var("INVENTORY_FILE");
        let inventory_contents = var("INVENTORY_CONTENTS");
        let inventory_url = var("INVENTORY_URL");
        let sources = [&inventory_file, &inventory_contents, &inventory_url]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if sources > 1 {
            return Err(Error::input(
                "only one inventory environment variable is allowed \
                 (INVENTORY_FILE, INVENTORY_CONTENTS or INVENTORY_URL)",
            ));
        }
        if let Some(file) = inventory_file {
            self.inventory_file = file;
        }
        if let Some(contents) = inventory_contents {
            let path = self.temp_file_path(INVENTORY_CONTENTS_FILE);
            write_private_file(&path, &contents)?;
            debug!(path = %path, "Wrote INVENTORY_CONTENTS");
            self.inventory_file = path;
        }
        if let Some(url) = inventory_url {
            warn!(url = %url, "INVENTORY_URL is not fetched; the inventory file must already exist");
            self.inventory_file = self.temp_file_path(INVENTORY_CONTENTS_FILE);
        }

        if let Some(limit) = var("LIMIT_HOST") {
            self.limit_host = limit;
        }

        // Extra vars: at most one source
        let extra_vars_file = var("EXTRA_VARS_FILE");
        let extra_vars_contents = var("EXTRA_VARS_CONTENTS");
        if extra_vars_file.is_some() && extra_vars_contents.is_some() {
            return Err(Error::input(
                "only one extra-vars environment variable is allowed \
                 (EXTRA_VARS_FILE or EXTRA_VARS_CONTENTS)",
            ));
        }
        if let Some(file) = extra_vars_file {
            self.extra_vars_file = file;
        }
        if let Some(contents) = extra_vars_contents {
            let path = self.temp_file_path(EXTRA_VARS_CONTENTS_FILE);
            write_private_file(&path, &contents)?;
            debug!(path = %path, "Wrote EXTRA_VARS_CONTENTS");
            self.extra_vars_file = path;
        }

        if let Some(tags) = var("ANSIBLE_TAGS") {
            self.ansible_tags = tags;
        }

        if let Some(tags) = var("ANSIBLE_SKIP_TAGS") {
            self.ansible_skip_tags = tags;
        }

        if let Some(args) = var("EXTRA_ARGS") {
            self.extra_args = args;
        }

        if let Some(group) = var("WINDOWS_GROUP") {
            self.windows_group = group;
        }

        if let Some(venv) = var("VIRTUAL_ENV") {
            self.virtual_env_path = venv;
        }

        if let Some(image) = var("CONTAINER_IMAGE") {
            self.image = image;
        }

        if let Some(timeout) = var("ANSIBLE_PLAYBOOK_TIMEOUT") {
            self.playbook_timeout = timeout.trim().parse().map_err(|_| {
                Error::input(format!(
                    "ANSIBLE_PLAYBOOK_TIMEOUT must be an integer number of seconds, got '{}'",
                    timeout
                ))
            })?;
        }

        Ok(())
    }

    /// Path of a file inside the temp directory.
    pub fn temp_file_path(&self, name: &str) -> String {
        format!("{}/{}", self.temp_dir_path.trim_end_matches('/'), name)
    }

    /// Path of the configuration handed to a containerized run.
    pub fn container_config_path(&self) -> String {
        self.temp_file_path("container-config.yml")
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Playbook timeout, `None` when unlimited.
    pub fn timeout_secs(&self) -> Option<u64> {
        u64::try_from(self.playbook_timeout).ok().filter(|t| *t > 0)
    }
}

/// Recursively merge `overlay` into `base`. Mappings merge key by key,
/// anything else replaces.
fn overlay_value(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        overlay_value(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Write `contents` to `path` with owner-only permissions.
pub(crate) fn write_private_file(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

// ============================================================================
// System-wide defaults
// ============================================================================

/// Values suggested for new configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalDefaults {
    pub remote_user: String,
    pub image: String,
}

/// Values enforced regardless of the user's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalForce {
    /// Lint rules copied to `./.ansible-lint` before every lint run
    pub ansible_lint_file_path: String,
    pub ansible_lint_file_url: String,
}

/// Contents of the system-wide defaults file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    #[serde(rename = "default")]
    pub defaults: GlobalDefaults,
    pub force: GlobalForce,
}

impl GlobalConfig {
    /// Read the defaults file at `path`. A missing file yields `None`.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Read the system-wide defaults file, logging and ignoring read failures.
    pub fn load_system() -> Option<Self> {
        match Self::load(GLOBAL_CONFIG_PATH) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring global defaults: {}", e);
                None
            }
        }
    }

    /// Copy non-empty defaults onto `config`.
    pub fn apply_defaults(&self, config: &mut PlaybookConfig) {
        if !self.defaults.remote_user.is_empty() {
            config.remote_user = self.defaults.remote_user.clone();
        }
        if !self.defaults.image.is_empty() {
            config.image = self.defaults.image.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_source(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn config_in(temp: &TempDir) -> PlaybookConfig {
        PlaybookConfig {
            temp_dir_path: temp.path().join("work").display().to_string(),
            ..PlaybookConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = PlaybookConfig::new();
        assert_eq!(config.playbook_timeout, 86400);
        assert_eq!(config.verbose_level, 1);
        assert_eq!(config.temp_dir_path, "./.ansible-tui");
        assert_eq!(config.timeout_secs(), Some(86400));
        assert!(config.execution_type.is_none());
    }

    #[test]
    fn test_timeout_secs_unlimited() {
        let mut config = PlaybookConfig::new();
        config.playbook_timeout = -1;
        assert_eq!(config.timeout_secs(), None);
        config.playbook_timeout = 0;
        assert_eq!(config.timeout_secs(), None);
    }

    #[test]
    fn test_load_file_empty_path_is_noop() {
        let mut config = PlaybookConfig::new();
        config.load_file("").unwrap();
        assert_eq!(config, PlaybookConfig::new());
    }

    #[test]
    fn test_load_file_keeps_unset_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(
            &path,
            r#"
playbook: ./site.yml
inventory: ./hosts
execution-type: venv
environment-variables:
  set:
    FOO: bar
tui:
  image-filter: ansible
"#,
        )
        .unwrap();

        let mut config = PlaybookConfig::new();
        config.remote_user = "deploy".to_string();
        config.tui.playbook_dir = "./playbooks".to_string();
        config.load_file(&path).unwrap();

        assert_eq!(config.playbook, "./site.yml");
        assert_eq!(config.inventory_file, "./hosts");
        assert_eq!(config.execution_type, Some(ExecutionType::Venv));
        assert_eq!(config.remote_user, "deploy");
        assert_eq!(config.playbook_timeout, 86400);
        assert_eq!(config.environment_variables.set["FOO"], "bar");
        assert_eq!(config.tui.image_filter, "ansible");
        assert_eq!(config.tui.playbook_dir, "./playbooks");
        assert_eq!(config.config_file_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_file_errors() {
        let temp = TempDir::new().unwrap();
        let mut config = PlaybookConfig::new();

        let err = config.load_file(temp.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));

        let bad = temp.path().join("bad.yml");
        fs::write(&bad, "verbose-level: [1, 2]\n").unwrap();
        let err = config.load_file(&bad).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.is_input());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(
            &path,
            "playbook: ./from-file.yml\nremote-user: file-user\nlimit: web\nplaybook-timeout: 60\n",
        )
        .unwrap();

        let mut config = config_in(&temp);
        config.load_file(&path).unwrap();
        config
            .apply_env_from(env_source(&[
                ("PLAYBOOK", "./from-env.yml"),
                ("ANSIBLE_REMOTE_USER", "env-user"),
                ("LIMIT_HOST", "db"),
                ("ANSIBLE_PLAYBOOK_TIMEOUT", "120"),
                ("VERBOSE_LEVEL", "3"),
                ("CONTAINER_IMAGE", "quay.io/ansible/runner"),
            ]))
            .unwrap();

        assert_eq!(config.playbook, "./from-env.yml");
        assert_eq!(config.remote_user, "env-user");
        assert_eq!(config.limit_host, "db");
        assert_eq!(config.playbook_timeout, 120);
        assert_eq!(config.verbose_level, 3);
        assert_eq!(config.image, "quay.io/ansible/runner");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.playbook = "./site.yml".to_string();
        config
            .apply_env_from(env_source(&[("PLAYBOOK", ""), ("LIMIT_HOST", "")]))
            .unwrap();
        assert_eq!(config.playbook, "./site.yml");
        assert_eq!(config.limit_host, "");
    }

    #[test]
    fn test_env_creates_temp_dir() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.apply_env_from(env_source(&[])).unwrap();
        assert!(temp.path().join("work").is_dir());
    }

    #[test]
    fn test_env_tmp_dir_path() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("other").display().to_string();
        let mut config = config_in(&temp);
        config
            .apply_env_from(env_source(&[("TMP_DIR_PATH", &dir)]))
            .unwrap();
        assert_eq!(config.temp_dir_path, dir);
        assert!(temp.path().join("other").is_dir());
    }

    #[test]
    fn test_bad_verbose_level_is_kept() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.verbose_level = 2;
        config
            .apply_env_from(env_source(&[("VERBOSE_LEVEL", "loud")]))
            .unwrap();
        assert_eq!(config.verbose_level, 2);
    }

    #[test]
    fn test_bad_timeout_is_error() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        let err = config
            .apply_env_from(env_source(&[("ANSIBLE_PLAYBOOK_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn test_inventory_contents_written_to_temp_dir() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config
            .apply_env_from(env_source(&[("INVENTORY_CONTENTS", "[web]\nhost1\n")]))
            .unwrap();

        let expected = temp.path().join("work").join("hosts-INVENTORY");
        assert_eq!(config.inventory_file, expected.display().to_string());
        assert_eq!(fs::read_to_string(&expected).unwrap(), "[web]\nhost1\n");
    }

    #[test]
    fn test_extra_vars_contents_written_to_temp_dir() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config
            .apply_env_from(env_source(&[("EXTRA_VARS_CONTENTS", "foo: bar\n")]))
            .unwrap();

        let expected = temp.path().join("work").join("PLAYBOOK-extravars");
        assert_eq!(config.extra_vars_file, expected.display().to_string());
        assert_eq!(fs::read_to_string(&expected).unwrap(), "foo: bar\n");
    }

    #[test]
    fn test_multiple_inventory_sources_rejected() {
        let temp = TempDir::new().unwrap();
        for vars in [
            [("INVENTORY_FILE", "./hosts"), ("INVENTORY_CONTENTS", "host1")],
            [("INVENTORY_FILE", "./hosts"), ("INVENTORY_URL", "https://x/hosts")],
            [("INVENTORY_CONTENTS", "host1"), ("INVENTORY_URL", "https://x/hosts")],
        ] {
            let mut config = config_in(&temp);
            let err = config.apply_env_from(env_source(&vars)).unwrap_err();
            assert!(err.is_input());
            assert!(err
                .to_string()
                .contains("only one inventory environment variable"));
        }
    }

    #[test]
    fn test_multiple_extra_vars_sources_rejected() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        let err = config
            .apply_env_from(env_source(&[
                ("EXTRA_VARS_FILE", "./vars.yml"),
                ("EXTRA_VARS_CONTENTS", "a: 1"),
            ]))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("only one extra-vars environment variable"));
    }

    #[test]
    fn test_inventory_url_selects_temp_inventory() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config
            .apply_env_from(env_source(&[("INVENTORY_URL", "https://example.com/hosts")]))
            .unwrap();
        assert!(config.inventory_file.ends_with("/hosts-INVENTORY"));
    }

    #[test]
    fn test_yaml_round_trip_skips_runtime_fields() {
        let mut config = PlaybookConfig::new();
        config.playbook = "./site.yml".to_string();
        config.metrics.exit_code = 2;
        config.config_file_path = Some(PathBuf::from("./x.yml"));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("playbook: ./site.yml"));
        assert!(!yaml.contains("metrics"));
        assert!(!yaml.contains("execution-type"));

        let parsed: PlaybookConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.playbook, "./site.yml");
        assert_eq!(parsed.metrics, Metrics::default());
    }

    #[test]
    fn test_global_config() {
        let temp = TempDir::new().unwrap();
        assert!(GlobalConfig::load(temp.path().join("none.yml"))
            .unwrap()
            .is_none());

        let path = temp.path().join("global.yml");
        fs::write(
            &path,
            "default:\n  remote-user: ansible\n  image: registry/ansible:latest\nforce:\n  ansible-lint-file-path: /etc/ansible/lint.yml\n",
        )
        .unwrap();
        let global = GlobalConfig::load(&path).unwrap().unwrap();
        assert_eq!(global.force.ansible_lint_file_path, "/etc/ansible/lint.yml");

        let mut config = PlaybookConfig::new();
        config.remote_user = "me".to_string();
        global.apply_defaults(&mut config);
        assert_eq!(config.remote_user, "ansible");
        assert_eq!(config.image, "registry/ansible:latest");
    }
}
