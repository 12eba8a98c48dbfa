//! Starter configuration files for `-g`.

use crate::config::{GlobalConfig, PlaybookConfig, TuiParams};
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const PLAYBOOK_MARKERS: [&str; 2] = ["site.yml", "site.yaml"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Template<'a> {
    image: &'a str,
    ssh_private_key_file: &'a str,
    remote_user: &'a str,
    inventory: &'a str,
    playbook: &'a str,
    verbose_level: i64,
    tui: TuiParams,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Directory the front end should browse for playbooks.
///
/// `./playbooks` if present, otherwise the directory of the first
/// `site.yml`/`site.yaml` under `root`, otherwise `root` itself.
pub fn find_playbook_dir(root: &Path) -> String {
    if root.join("playbooks").is_dir() {
        debug!("Found playbook directory: ./playbooks");
        return "./playbooks".to_string();
    }

    let found = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_type().is_file()
                && e.file_name()
                    .to_str()
                    .is_some_and(|name| PLAYBOOK_MARKERS.contains(&name))
        });

    if let Some(entry) = found {
        let dir = entry
            .path()
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        debug!("Found playbook directory based on file: {}", entry.path().display());
        return if dir.is_empty() {
            ".".to_string()
        } else {
            format!("./{}", dir)
        };
    }

    debug!("No playbooks found, using current directory");
    ".".to_string()
}

/// Directory the front end should browse for inventories.
pub fn find_inventory_dir(root: &Path) -> String {
    if root.join("inventory").is_dir() {
        debug!("Found inventory directory: ./inventory");
        "./inventory".to_string()
    } else {
        ".".to_string()
    }
}

/// Render the starter configuration for `config`, discovering directories under `root`.
pub fn render_template(config: &PlaybookConfig, root: &Path, global: Option<&GlobalConfig>) -> Result<String> {
    let mut merged = config.clone();
    if let Some(global) = global {
        global.apply_defaults(&mut merged);
    }

    let template = Template {
        image: &merged.image,
        ssh_private_key_file: "~/.ssh/id_rsa",
        remote_user: &merged.remote_user,
        inventory: "",
        playbook: "",
        verbose_level: 0,
        tui: TuiParams {
            playbook_dir: find_playbook_dir(root),
            inventory_dir: find_inventory_dir(root),
            image_filter: "ansible".to_string(),
            virtual_envs_dir: String::new(),
        },
    };

    let body = serde_yaml::to_string(&template)?;
    Ok(format!("---\n# virtual-env-path: \"\"\n{}", body))
}

/// Write the starter configuration to `path`, creating parent directories.
pub fn generate_template_file(
    config: &PlaybookConfig,
    path: impl AsRef<Path>,
    global: Option<&GlobalConfig>,
) -> Result<()> {
    let path = path.as_ref();
    let contents = render_template(config, Path::new("."), global)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    info!("Wrote configuration template to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalDefaults;
    use tempfile::TempDir;

    #[test]
    fn test_playbook_dir_prefers_playbooks() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("playbooks")).unwrap();
        fs::create_dir_all(temp.path().join("deploy")).unwrap();
        fs::write(temp.path().join("deploy/site.yml"), "").unwrap();
        assert_eq!(find_playbook_dir(temp.path()), "./playbooks");
    }

    #[test]
    fn test_playbook_dir_from_site_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("ops/ansible")).unwrap();
        fs::write(temp.path().join("ops/ansible/site.yaml"), "").unwrap();
        assert_eq!(find_playbook_dir(temp.path()), "./ops/ansible");
    }

    #[test]
    fn test_playbook_dir_skips_hidden() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".cache")).unwrap();
        fs::write(temp.path().join(".cache/site.yml"), "").unwrap();
        assert_eq!(find_playbook_dir(temp.path()), ".");

        fs::write(temp.path().join("site.yml"), "").unwrap();
        assert_eq!(find_playbook_dir(temp.path()), ".");
    }

    #[test]
    fn test_inventory_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_inventory_dir(temp.path()), ".");
        fs::create_dir(temp.path().join("inventory")).unwrap();
        assert_eq!(find_inventory_dir(temp.path()), "./inventory");
    }

    #[test]
    fn test_render_template_merges_global_defaults() {
        let temp = TempDir::new().unwrap();
        let mut config = PlaybookConfig::new();
        config.remote_user = "me".to_string();
        let global = GlobalConfig {
            defaults: GlobalDefaults {
                remote_user: "ansible".to_string(),
                image: "registry/ansible:9".to_string(),
            },
            ..GlobalConfig::default()
        };

        let text = render_template(&config, temp.path(), Some(&global)).unwrap();
        assert!(text.starts_with("---\n"));

        let parsed: PlaybookConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed.remote_user, "ansible");
        assert_eq!(parsed.image, "registry/ansible:9");
        assert_eq!(parsed.ssh_private_key_file, "~/.ssh/id_rsa");
        assert_eq!(parsed.verbose_level, 0);
        assert_eq!(parsed.playbook, "");
        assert_eq!(parsed.tui.image_filter, "ansible");
        assert_eq!(parsed.tui.playbook_dir, ".");
    }
}
