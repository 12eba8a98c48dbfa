//! CLI module for ansible-shim
//!
//! Flag parsing and the mapping from flags to the command that runs.

pub mod commands;

use ansible_shim::lint::LintTarget;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Long flags that are also accepted with a single dash, e.g. `-nt`, `-version`.
const SINGLE_DASH_LONG: &[&str] = &[
    "nt",
    "no-tui",
    "version",
    "generate",
    "config",
    "lp",
    "la",
    "lint-playbook",
    "lint-all",
    "http-addr",
];

/// ansible-shim - launch ansible-playbook from a YAML configuration
///
/// Settings are read from the configuration file and then overridden by
/// environment variables. The playbook runs on the host, in a Python
/// virtualenv, or inside a container image.
#[derive(Parser, Debug, Clone)]
#[command(name = "ansible-shim")]
#[command(about = "Launch ansible-playbook from a YAML configuration", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long, env = "PB_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Generate a configuration template and exit
    #[arg(short = 'g', long)]
    pub generate: bool,

    /// Run without the interactive front end
    #[arg(
        long = "nt",
        visible_alias = "no-tui",
        env = "NO_TUI",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub no_tui: bool,

    /// Log verbosity (-v, -vv)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Print version and build date, then exit
    #[arg(long)]
    pub version: bool,

    /// Run ansible-lint against the configured playbook
    #[arg(long = "lp", visible_alias = "lint-playbook", conflicts_with = "lint_all")]
    pub lint_playbook: bool,

    /// Run ansible-lint against everything in the working directory
    #[arg(long = "la", visible_alias = "lint-all")]
    pub lint_all: bool,

    /// Serve the HTTP API on HOST:PORT instead of running once
    #[cfg(feature = "api")]
    #[arg(long, env = "HTTP_ADDR")]
    pub http_addr: Option<String>,
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Version,
    Generate,
    Lint(LintTarget),
    #[cfg(feature = "api")]
    Serve(String),
    Run,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse_from(normalize_args(std::env::args_os()))
    }

    /// Verbosity for the initial log level (0-2)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(2)
    }

    /// The single action these flags select. Earlier checks win.
    pub fn action(&self) -> Action {
        if self.version {
            return Action::Version;
        }
        if self.generate {
            return Action::Generate;
        }
        if self.lint_playbook {
            return Action::Lint(LintTarget::Playbook);
        }
        if self.lint_all {
            return Action::Lint(LintTarget::All);
        }
        #[cfg(feature = "api")]
        {
            if let Some(addr) = &self.http_addr {
                return Action::Serve(addr.clone());
            }
        }
        Action::Run
    }
}

/// Rewrite single-dash long flags (`-nt`, `-http-addr=:80`) to their `--` form.
///
/// Everything after a bare `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut positional = false;
    for arg in args {
        let arg: OsString = arg.into();
        if !positional {
            if arg == "--" {
                positional = true;
            } else if let Some(long) = single_dash_long(&arg) {
                normalized.push(long);
                continue;
            }
        }
        normalized.push(arg);
    }
    normalized
}

fn single_dash_long(arg: &OsStr) -> Option<OsString> {
    let text = arg.to_str()?;
    let body = text.strip_prefix('-').filter(|b| !b.starts_with('-'))?;
    let name = body.split_once('=').map_or(body, |(name, _)| name);
    SINGLE_DASH_LONG
        .contains(&name)
        .then(|| OsString::from(format!("-{}", text)))
}
