//! Path security utilities
//!
//! Every user supplied path that ends up on an `ansible-playbook` command line
//! or inside a container volume mount goes through here. The checks are
//! deliberately conservative:
//! - only `[A-Za-z0-9./_-]` characters are accepted
//! - the sequence `..` is rejected anywhere, even inside a file name
//! - symlinks must resolve to an existing target

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Characters accepted in a path.
static PATH_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9./\-_]+$").expect("Invalid path name regex"));

/// Paths written relative to the working directory.
static DOT_SLASH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\./").expect("Invalid dot slash regex"));

/// What a validated path is expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A regular file (or anything that is not a directory)
    File,
    /// A directory
    Directory,
}

/// Sanitize a path and return its symlink-resolved form.
///
/// # Examples
///
/// ```
/// use ansible_shim::security::sanitize_path;
///
/// assert!(sanitize_path("./playbooks/../secret").is_err());
/// assert!(sanitize_path("./my playbook.yml").is_err());
/// ```
pub fn sanitize_path(path: &str) -> Result<PathBuf> {
    if !PATH_NAME_REGEX.is_match(path) {
        return Err(Error::invalid_path(path, "invalid characters in path"));
    }

    if path.contains("..") {
        return Err(Error::invalid_path(
            path,
            "relative back traversal not allowed in paths",
        ));
    }

    let resolved = fs::canonicalize(path).map_err(|e| {
        Error::invalid_path(path, format!("path could not be resolved ({})", e))
    })?;

    if resolved != Path::new(path) {
        debug!(path = %path, resolved = %resolved.display(), "Resolved path");
    }

    Ok(resolved)
}

/// Check that `path` exists and is of the expected kind.
pub fn path_exists(path: impl AsRef<Path>, kind: PathKind) -> Result<()> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)
        .map_err(|_| Error::invalid_path(path.display().to_string(), "path does not exist"))?;

    match kind {
        PathKind::Directory if !metadata.is_dir() => {
            warn!(
                "Path was expected to be a directory, not a file: {}",
                path.display()
            );
            Err(Error::invalid_path(
                path.display().to_string(),
                "path must be a directory",
            ))
        }
        PathKind::File if metadata.is_dir() => Err(Error::invalid_path(
            path.display().to_string(),
            "path must be a file, not a directory",
        )),
        _ => Ok(()),
    }
}

/// Sanitize `path` and check it exists as `kind`.
pub fn validate_path(path: &str, kind: PathKind) -> Result<PathBuf> {
    let resolved = sanitize_path(path)?;
    path_exists(path, kind)?;
    Ok(resolved)
}

/// Returns true if the path is written relative to the working directory (`./...`).
pub fn is_dot_relative(path: &str) -> bool {
    DOT_SLASH_REGEX.is_match(path)
}

/// Create a directory (mode 0750) unless it already exists.
///
/// An existing entry at `path` that is not a directory is an error.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::create_dir(path) {
        Ok(()) => {
            set_dir_mode(path)?;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if fs::metadata(path)?.is_dir() {
                Ok(())
            } else {
                Err(Error::invalid_path(
                    path.display().to_string(),
                    "path exists but is not a directory",
                ))
            }
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn set_dir_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o750))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_mode(_path: &Path) -> Result<()> {
    Ok(())
}
