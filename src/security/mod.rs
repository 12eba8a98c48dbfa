//! Security checks for user supplied input.
//!
//! Paths from configuration files, environment variables and HTTP requests
//! are mounted into containers and passed to Ansible verbatim, so they are
//! restricted to a small character set and must resolve to real files.

pub mod path;

pub use path::{ensure_dir, is_dot_relative, path_exists, sanitize_path, validate_path, PathKind};
