//! Shared helpers for the ansible-shim integration tests.
//!
//! The Ansible tools are replaced by small shell scripts written into a
//! temporary directory that is put first on the execution context's `PATH`.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use ansible_shim::config::PlaybookConfig;
use ansible_shim::env::ExecutionContext;
use tempfile::TempDir;

/// Graph output with one duplicate host across groups.
pub const SAMPLE_GRAPH: &str = "@all:
  |--@ungrouped:
  |--@web:
  |  |--web1
  |  |--web2
  |--@db:
  |  |--db1
  |  |--web1
";

/// Write an executable `#!/bin/sh` script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A fake `ansible-inventory` that prints `graph` and exits with `rc`.
pub fn fake_inventory(dir: &Path, graph: &str, rc: i32) -> PathBuf {
    write_script(
        dir,
        "ansible-inventory",
        &format!("cat <<'GRAPH'\n{}GRAPH\nexit {}", graph, rc),
    )
}

/// Context whose `PATH` is `dir` followed by the system directories.
pub fn context_with_path(dir: &Path) -> ExecutionContext {
    let mut ctx = ExecutionContext::new();
    ctx.set("PATH", format!("{}:/usr/bin:/bin", dir.display()));
    ctx.set("HOME", dir.display().to_string());
    ctx
}

/// Directory for fake tools plus a configuration using the repo fixtures.
pub struct Sandbox {
    pub bin: TempDir,
    pub work: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            bin: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        self.bin.path()
    }

    pub fn context(&self) -> ExecutionContext {
        context_with_path(self.bin.path())
    }

    /// A configuration that passes validation from the crate root.
    pub fn config(&self) -> PlaybookConfig {
        PlaybookConfig {
            playbook: "./tests/fixtures/playbook-simple.yml".to_string(),
            inventory_file: "./tests/fixtures/inventory-localhost.txt".to_string(),
            temp_dir_path: self.work.path().display().to_string(),
            verbose_level: 0,
            ..PlaybookConfig::default()
        }
    }

    /// File inside the work directory.
    pub fn work_file(&self, name: &str) -> PathBuf {
        self.work.path().join(name)
    }
}
