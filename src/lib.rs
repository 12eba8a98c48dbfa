//! # ansible-shim
//!
//! A launcher for `ansible-playbook`. Parameters come from a YAML file, the
//! environment or an HTTP request; they are merged into one
//! [`PlaybookConfig`](config::PlaybookConfig), validated, and then used to
//! start `ansible-playbook` on the host, inside a Python virtualenv, or
//! inside a container image.
//!
//! ## Pipeline
//!
//! ```text
//!  defaults ─┐
//!  YAML file ├─► PlaybookConfig ─► validate ─► ExecutionContext ─► PlaybookRunner
//!  env vars ─┘                                                        │
//!                                        ┌────────────────────────────┤
//!                                        ▼                            ▼
//!                               ansible-inventory --graph     ansible-playbook
//!                               (host count, health)          (or container run)
//! ```
//!
//! Child processes never see the launcher's own environment. Each run gets
//! an explicit [`ExecutionContext`](env::ExecutionContext) built from the
//! configuration's `environment-variables` policy, so concurrent runs
//! cannot observe each other's variables.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use ansible_shim::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = PlaybookConfig::load(Some("./config.yml".as_ref()))?;
//!     validate_inputs(&mut config)?;
//!
//!     let context = ExecutionContext::project(&config)?;
//!     let rc = PlaybookRunner::new(context).run(&mut config).await?;
//!     std::process::exit(rc);
//! }
//! ```

#![warn(clippy::all)]

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::{GlobalConfig, PlaybookConfig};
    pub use crate::env::ExecutionContext;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::inventory::{InventoryGraph, InventoryGrapher};
    pub use crate::lint::LintTarget;
    pub use crate::playbook::{ExecutionMode, PlaybookRunner};
    pub use crate::runner::{CommandOutput, CommandRunner, RunOptions};
    pub use crate::validate::validate_inputs;
}

// ============================================================================
// Configuration
// ============================================================================

/// Playbook configuration, its sources and the system-wide defaults file.
pub mod config;

/// Input validation and normalization.
pub mod validate;

/// Starter configuration generation (`-g`).
pub mod template;

/// Error types and the [`Result`](error::Result) alias.
pub mod error;

/// Logging setup and runtime verbosity changes.
pub mod logging;

/// Path sanitization and filesystem checks.
pub mod security;

// ============================================================================
// Execution
// ============================================================================

/// Per-run environment for child processes.
pub mod env;

/// Subprocess execution with streamed output, capture and timeouts.
///
/// Every external tool is started through [`CommandRunner`](runner::CommandRunner):
/// - stdout and stderr are read concurrently and echoed line by line
/// - over-long lines are truncated instead of buffered without bound
/// - a timeout terminates the whole process group
pub mod runner;

/// `ansible-inventory --graph` parsing and inventory health checks.
pub mod inventory;

/// `ansible-playbook` invocation and execution modes.
pub mod playbook;

/// `ansible-lint` invocation.
pub mod lint;

/// Container runtime detection and `run` invocations.
pub mod container;

// ============================================================================
// HTTP API
// ============================================================================

/// HTTP front end accepting playbook configurations as JSON.
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of ansible-shim.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build date stamped in by the packaging pipeline through `BUILD_DATE`.
pub fn build_date() -> &'static str {
    option_env!("BUILD_DATE").unwrap_or("unknown")
}

/// One-line version string for `--version`.
pub fn version_string() -> String {
    format!("ansible-shim {} (built {})", version(), build_date())
}
