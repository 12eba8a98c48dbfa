//! Inventory health checks through `ansible-inventory --graph`.
//!
//! The graph output is a tree drawn with `|--` connectors:
//!
//! ```text
//! @all:
//!   |--@ungrouped:
//!   |  |--localhost
//!   |--@web:
//!   |  |--web1
//! ```
//!
//! Group lines end in `@name:`, host lines end in `|--name`. Only this narrow
//! grammar is interpreted. `ansible-inventory` exits 0 for some parse
//! failures, so stderr is scanned for [`PARSE_ERROR_MARKER`] as well.

use crate::config::PlaybookConfig;
use crate::container::ContainerExecutor;
use crate::env::ExecutionContext;
use crate::error::{Error, Result};
use crate::runner::{exit_code_of, CommandRunner, LineReader, RunOptions, DEFAULT_MAX_LINE_LENGTH};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Substring `ansible-inventory` writes to stderr when a source fails to parse.
pub const PARSE_ERROR_MARKER: &str = ": Unable to parse";

/// Timeout for [`InventoryGrapher::fetch`].
const FETCH_TIMEOUT_SECS: i64 = 30;

static GROUP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([\w._-]+):$").expect("Invalid group regex"));

static HOST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|--([\w._-]+)$").expect("Invalid host regex"));

/// Kind of a graph entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Host,
    Group,
}

/// One parsed line of graph output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Classify one line of graph output.
///
/// # Examples
///
/// ```
/// use ansible_shim::inventory::{parse_graph_entry, EntryKind};
///
/// assert_eq!(parse_graph_entry("  |--@web:").unwrap().kind, EntryKind::Group);
/// assert_eq!(parse_graph_entry("  |  |--web1").unwrap().name, "web1");
/// assert!(parse_graph_entry("|--web:children").is_err());
/// ```
pub fn parse_graph_entry(line: &str) -> Result<GraphEntry> {
    if let Some(caps) = GROUP_REGEX.captures(line) {
        return Ok(GraphEntry {
            name: caps[1].to_string(),
            kind: EntryKind::Group,
        });
    }
    if let Some(caps) = HOST_REGEX.captures(line) {
        return Ok(GraphEntry {
            name: caps[1].to_string(),
            kind: EntryKind::Host,
        });
    }
    Err(Error::GraphEntry(line.to_string()))
}

/// Hosts and groups seen in graph output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryGraph {
    hosts: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl InventoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from output lines, ignoring lines that are neither hosts nor groups.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for line in lines {
            graph.add_line(line.as_ref());
        }
        graph
    }

    /// Record one output line.
    pub fn add_line(&mut self, line: &str) {
        match parse_graph_entry(line) {
            Ok(GraphEntry {
                name,
                kind: EntryKind::Group,
            }) => {
                self.groups.insert(name);
            }
            Ok(GraphEntry {
                name,
                kind: EntryKind::Host,
            }) => {
                self.hosts.insert(name);
            }
            Err(_) => {}
        }
    }

    /// Number of distinct hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

/// Runs `ansible-inventory` against a configuration's inventory.
#[derive(Debug, Clone)]
pub struct InventoryGrapher {
    context: ExecutionContext,
}

impl InventoryGrapher {
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// Context with the configured virtualenv first on `PATH`.
    fn tool_context(&self, config: &PlaybookConfig) -> Result<ExecutionContext> {
        let mut ctx = self.context.clone();
        if !config.virtual_env_path.is_empty() {
            ctx.prepend_path(Path::new(&config.virtual_env_path).join("bin"))?;
            info!("Using virtualenv for ansible-inventory");
        }
        Ok(ctx)
    }

    /// Check the inventory and record its distinct host count in the metrics.
    ///
    /// Fails with [`Error::InvalidInventory`] when `ansible-inventory` exits
    /// non-zero or reports a parse failure on stderr.
    pub async fn validate(&self, config: &mut PlaybookConfig) -> Result<usize> {
        let ctx = self.tool_context(config)?;
        let program = ctx.lookup("ansible-inventory")?;
        let args = ["-i", config.inventory_file.as_str(), "--graph"];
        info!(
            "Running: {} {}",
            program.display(),
            args.join(" ")
        );

        let mut command = Command::new(&program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        ctx.apply(&mut command);

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            command: program.display().to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let graph_task = tokio::spawn(read_graph(stdout));
        let stderr_task = tokio::spawn(scan_stderr(stderr));

        let mut rc = match child.wait().await {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                warn!("Waiting for ansible-inventory failed: {}", e);
                1
            }
        };

        // Both readers must be done before the count is read.
        let (graph, parse_error) = tokio::join!(graph_task, stderr_task);
        let graph = graph.map_err(|e| Error::Execution(format!("inventory reader failed: {}", e)))?;
        let parse_error =
            parse_error.map_err(|e| Error::Execution(format!("inventory reader failed: {}", e)))?;

        if parse_error {
            info!("Set verbose-level >= 3 to see ansible-inventory error message.");
            rc = 1;
        }

        let count = graph.host_count();
        config.metrics.inventory_count = count;
        info!("Inventory host count: {}", count);

        if rc != 0 {
            warn!("ansible-inventory rc={}", rc);
            return Err(Error::InvalidInventory);
        }
        Ok(count)
    }

    /// Run `ansible-inventory -i <path> --graph` and return its output lines.
    ///
    /// Runs inside the configured container image when one is set.
    pub async fn fetch(&self, config: &PlaybookConfig, path: &str) -> Result<Vec<String>> {
        let args = vec!["-i".to_string(), path.to_string(), "--graph".to_string()];
        let options = RunOptions::new()
            .with_capture()
            .with_timeout_secs(FETCH_TIMEOUT_SECS);

        let output = if !config.image.is_empty() {
            ContainerExecutor::new(self.context.clone())
                .run(config, "ansible-inventory", &args, options)
                .await?
        } else {
            let ctx = self.tool_context(config)?;
            let program = ctx.lookup("ansible-inventory")?;
            CommandRunner::new(ctx)
                .with_options(options)
                .run(&program, &args)
                .await?
        };

        if !output.success() {
            warn!("ansible-inventory --graph rc={}", output.exit_code);
        }
        Ok(output.lines)
    }
}

async fn read_graph<R: AsyncRead + Unpin>(pipe: Option<R>) -> InventoryGraph {
    let mut graph = InventoryGraph::new();
    let Some(pipe) = pipe else {
        return graph;
    };
    let mut reader = LineReader::new(BufReader::new(pipe), DEFAULT_MAX_LINE_LENGTH);
    loop {
        match reader.next_line().await {
            Ok(Some(line)) => graph.add_line(&line),
            Ok(None) => break,
            Err(e) => {
                warn!("Reading ansible-inventory stdout: {}", e);
                break;
            }
        }
    }
    graph
}

async fn scan_stderr<R: AsyncRead + Unpin>(pipe: Option<R>) -> bool {
    let Some(pipe) = pipe else {
        return false;
    };
    let mut found = false;
    let mut reader = LineReader::new(BufReader::new(pipe), DEFAULT_MAX_LINE_LENGTH);
    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                debug!("ansible-inventory: {}", line);
                if line.contains(PARSE_ERROR_MARKER) {
                    found = true;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Reading ansible-inventory stderr: {}", e);
                break;
            }
        }
    }
    found
}
