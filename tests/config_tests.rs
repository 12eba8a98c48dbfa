//! Configuration loading against the real process environment.
//!
//! These tests change process-wide environment variables and run serially.

use std::fs;

use ansible_shim::config::PlaybookConfig;
use ansible_shim::validate::validate_inputs_with_home;
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

const VARS: &[&str] = &[
    "PLAYBOOK",
    "INVENTORY_FILE",
    "INVENTORY_CONTENTS",
    "INVENTORY_URL",
    "EXTRA_VARS_FILE",
    "EXTRA_VARS_CONTENTS",
    "LIMIT_HOST",
    "VERBOSE_LEVEL",
    "TMP_DIR_PATH",
    "ANSIBLE_PLAYBOOK_TIMEOUT",
];

/// Sets variables for the lifetime of the guard, clearing the known ones first.
struct EnvGuard;

impl EnvGuard {
    fn set(vars: &[(&str, &str)]) -> Self {
        for name in VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
        EnvGuard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in VARS {
            std::env::remove_var(name);
        }
    }
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_environment_beats_file() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let path = write_config(
        &temp,
        "playbook: ./from-file.yml\ninventory: ./file-hosts\nlimit: web\nverbose-level: 3\n",
    );
    let _env = EnvGuard::set(&[
        ("PLAYBOOK", "./from-env.yml"),
        ("LIMIT_HOST", "db"),
        ("TMP_DIR_PATH", &work),
    ]);

    let config = PlaybookConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.playbook, "./from-env.yml");
    assert_eq!(config.limit_host, "db");
    assert_eq!(config.inventory_file, "./file-hosts");
    assert_eq!(config.verbose_level, 3);
    assert_eq!(config.temp_dir_path, work);
}

#[test]
#[serial]
fn test_two_inventory_variables_rejected() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let _env = EnvGuard::set(&[
        ("INVENTORY_FILE", "./hosts"),
        ("INVENTORY_CONTENTS", "localhost"),
        ("TMP_DIR_PATH", &work),
    ]);

    let err = PlaybookConfig::load(None).unwrap_err();
    assert!(err.is_input());
    assert!(err.to_string().contains("only one inventory environment variable"));
}

#[test]
#[serial]
fn test_nonexistent_inventory_file_fails_validation() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let _env = EnvGuard::set(&[
        ("PLAYBOOK", "./tests/fixtures/playbook-simple.yml"),
        ("INVENTORY_FILE", "./tests/fixtures/no-such-hosts"),
        ("TMP_DIR_PATH", &work),
    ]);

    let mut config = PlaybookConfig::load(None).unwrap();
    let err = validate_inputs_with_home(&mut config, None).unwrap_err();
    assert!(err.is_input());
    assert!(err.to_string().contains("no-such-hosts"));
}

#[test]
#[serial]
fn test_inventory_contents_become_inventory_file() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let _env = EnvGuard::set(&[
        ("INVENTORY_CONTENTS", "[local]\nlocalhost ansible_connection=local\n"),
        ("TMP_DIR_PATH", &work),
    ]);

    let config = PlaybookConfig::load(None).unwrap();
    assert_eq!(config.inventory_file, format!("{}/hosts-INVENTORY", work));
    assert!(fs::read_to_string(&config.inventory_file)
        .unwrap()
        .contains("localhost ansible_connection=local"));
}

#[test]
#[serial]
fn test_full_pipeline_with_fixtures() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let path = write_config(
        &temp,
        "playbook: ./tests/fixtures/playbook-simple.yml\n\
         inventory: ./tests/fixtures/inventory-localhost.txt\n\
         extra-vars-file: ./tests/fixtures/extra-vars.yml\n\
         verbose-level: 12\n",
    );
    let _env = EnvGuard::set(&[("TMP_DIR_PATH", &work)]);

    let mut config = PlaybookConfig::load(Some(path.as_path())).unwrap();
    validate_inputs_with_home(&mut config, None).unwrap();
    assert_eq!(config.verbose_level, 1);
    assert_eq!(config.extra_vars_file, "./tests/fixtures/extra-vars.yml");
}

#[test]
#[serial]
fn test_generated_files_in_absolute_temp_dir_validate() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let _env = EnvGuard::set(&[
        ("PLAYBOOK", "./tests/fixtures/playbook-simple.yml"),
        ("INVENTORY_CONTENTS", "localhost\n"),
        ("EXTRA_VARS_CONTENTS", "greeting: hello\n"),
        ("TMP_DIR_PATH", &work),
    ]);

    let mut config = PlaybookConfig::load(None).unwrap();
    assert!(config.inventory_file.starts_with('/'));
    validate_inputs_with_home(&mut config, None).unwrap();
    assert_eq!(config.inventory_file, format!("{}/hosts-INVENTORY", work));
    assert_eq!(config.extra_vars_file, format!("{}/PLAYBOOK-extravars", work));
}

#[test]
#[serial]
fn test_absolute_inventory_outside_temp_dir_rejected() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work").display().to_string();
    let hosts = temp.path().join("hosts");
    fs::write(&hosts, "localhost\n").unwrap();
    let hosts = hosts.display().to_string();
    let _env = EnvGuard::set(&[
        ("PLAYBOOK", "./tests/fixtures/playbook-simple.yml"),
        ("INVENTORY_FILE", &hosts),
        ("TMP_DIR_PATH", &work),
    ]);

    let mut config = PlaybookConfig::load(None).unwrap();
    let err = validate_inputs_with_home(&mut config, None).unwrap_err();
    assert!(err.to_string().contains("relative path"));
}
