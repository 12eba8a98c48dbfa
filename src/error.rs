//! Error types for ansible-shim.
//!
//! Every failure is classified into one of a few kinds. Input errors come
//! from bad, missing or conflicting configuration and are never retried.
//! Execution errors mean a subprocess could not be set up or started. A child
//! process exiting non-zero is not an error at all; it is reported through
//! its exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ansible-shim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad, missing or conflicting configuration.
    Input,
    /// A subprocess could not be located, prepared or started.
    Execution,
    /// Filesystem or serialization failure outside of validation.
    Io,
}

/// The main error type for ansible-shim.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Invalid or conflicting configuration value.
    #[error("{0}")]
    InvalidInput(String),

    /// A path failed sanitization or an existence check.
    #[error("{message}: {path}")]
    InvalidPath {
        /// The offending path as given
        path: String,
        /// What was wrong with it
        message: String,
    },

    /// Configuration file could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    ConfigRead {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for a playbook configuration.
    #[error("Failed to parse configuration '{path}': {source}")]
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// `ansible-inventory --graph` reported a failure.
    #[error("inventory is not valid")]
    InvalidInventory,

    /// A line of graph output matched neither the host nor the group form.
    #[error("could not parse ansible-inventory graph entry: {0}")]
    GraphEntry(String),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Neither podman nor docker is on the search path.
    #[error("container image was specified, but no container runtime could be found (docker or podman)")]
    NoContainerRuntime,

    /// A required program could not be found on the execution `PATH`.
    #[error("{program} lookup failed: {message}")]
    ProgramNotFound {
        /// Program name
        program: String,
        /// Lookup failure detail
        message: String,
    },

    /// The subprocess could not be started.
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        /// Command that failed to start
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The bounded request queue has no free slot.
    #[error("work queue full")]
    QueueFull,

    /// Generic execution failure.
    #[error("{0}")]
    Execution(String),

    // ========================================================================
    // I/O and Serialization
    // ========================================================================
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates an input error from a message.
    pub fn input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a path validation error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a program lookup error.
    pub fn program_not_found(program: impl Into<String>, message: impl ToString) -> Self {
        Self::ProgramNotFound {
            program: program.into(),
            message: message.to_string(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_)
            | Error::InvalidPath { .. }
            | Error::ConfigRead { .. }
            | Error::ConfigParse { .. }
            | Error::InvalidInventory
            | Error::GraphEntry(_) => ErrorKind::Input,
            Error::NoContainerRuntime
            | Error::ProgramNotFound { .. }
            | Error::Spawn { .. }
            | Error::QueueFull
            | Error::Execution(_) => ErrorKind::Execution,
            Error::Io(_) | Error::Yaml(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    /// Returns true for configuration problems.
    pub fn is_input(&self) -> bool {
        self.kind() == ErrorKind::Input
    }

    /// Returns the process exit code used when this error aborts a run.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
