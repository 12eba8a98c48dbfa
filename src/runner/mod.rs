//! Subprocess execution with merged, line-oriented output.
//!
//! [`CommandRunner`] starts a program inside an [`ExecutionContext`], drains
//! stdout and stderr concurrently into one ordered line stream, echoes each
//! line to our own stdout, optionally captures lines in memory or tees them to
//! a file, and enforces an overall timeout by signalling the child's whole
//! process group.
//!
//! A child exiting non-zero is a normal result. Only a failure to start the
//! process is returned as an error.

pub mod lines;

pub use lines::{LineReader, TRUNCATION_MARKER};

use crate::env::ExecutionContext;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Default cap on a single output line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Time a process group gets between SIGTERM and SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Time allowed for pipes to drain after the child has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overall deadline; `None` waits forever
    pub timeout: Option<Duration>,
    /// Keep every output line in [`CommandOutput::lines`]
    pub capture: bool,
    /// Write every output line to this file as well
    pub capture_file: Option<PathBuf>,
    /// Longest line kept before truncation
    pub max_line_length: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            capture: false,
            capture_file: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout in seconds; zero or negative means unlimited.
    pub fn with_timeout_secs(mut self, secs: i64) -> Self {
        self.timeout = u64::try_from(secs)
            .ok()
            .filter(|s| *s > 0)
            .map(Duration::from_secs);
        self
    }

    pub fn with_capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn with_capture_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_file = Some(path.into());
        self
    }

    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }
}

/// Result of a process that was started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Real exit code; `128 + signal` when killed by a signal, 1 when the
    /// wait itself failed
    pub exit_code: i32,
    /// Captured lines, empty unless capture was requested
    pub lines: Vec<String>,
    /// The deadline expired and the process group was killed
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs in a fixed execution context.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    context: ExecutionContext,
    options: RunOptions,
}

impl CommandRunner {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `program` with `args` to completion.
    pub async fn run<S: AsRef<OsStr>>(&self, program: S, args: &[String]) -> Result<CommandOutput> {
        let program = program.as_ref();
        let command_display = command_line(program, args);
        info!("Running: {}", command_display);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.context.apply(&mut command);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| {
            error!("Failed to start command: {}", source);
            Error::Spawn {
                command: command_display.clone(),
                source,
            }
        })?;
        info!(pid = ?child.id(), "Started {}", command_display);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel::<String>(256);
        let max = self.options.max_line_length;
        let readers = [
            stdout.map(|pipe| tokio::spawn(pump_lines(pipe, max, tx.clone()))),
            stderr.map(|pipe| tokio::spawn(pump_lines(pipe, max, tx.clone()))),
        ];
        drop(tx);
        let sink = tokio::spawn(collect_lines(
            rx,
            self.options.capture,
            self.options.capture_file.clone(),
        ));

        let (status, timed_out) = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => (status, false),
                Err(_) => {
                    warn!(
                        "Command exceeded timeout of {}s, terminating process group",
                        limit.as_secs()
                    );
                    (terminate(&mut child).await, true)
                }
            },
            None => (child.wait().await, false),
        };

        let exit_code = match status {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                error!("Waiting for command failed: {}", e);
                1
            }
        };

        // Background processes started by the child may still hold the pipes.
        let drain_deadline = tokio::time::Instant::now() + DRAIN_GRACE;
        for mut reader in readers.into_iter().flatten() {
            match tokio::time::timeout_at(drain_deadline, &mut reader).await {
                Ok(Err(e)) => warn!("Output reader task failed: {}", e),
                Ok(Ok(())) => {}
                Err(_) => {
                    warn!("Output pipe still open after exit, abandoning reader");
                    reader.abort();
                }
            }
        }
        let lines = sink.await.unwrap_or_else(|e| {
            warn!("Output sink task failed: {}", e);
            Vec::new()
        });

        info!("command finished: cmd={}, rc={}", command_display, exit_code);
        Ok(CommandOutput {
            exit_code,
            lines,
            timed_out,
        })
    }
}

/// Forward lines from one pipe into the shared channel.
pub(crate) async fn pump_lines<R>(pipe: R, max_length: usize, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = LineReader::new(BufReader::new(pipe), max_length);
    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Reading line from buffered output: {}", e);
                break;
            }
        }
    }
}

/// Echo, capture and tee every line until all senders are gone.
async fn collect_lines(
    mut rx: mpsc::Receiver<String>,
    capture: bool,
    capture_file: Option<PathBuf>,
) -> Vec<String> {
    let mut writer = match capture_file {
        Some(path) => match tokio::fs::File::create(&path).await {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                error!("Error creating capture file {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let mut stdout = Some(tokio::io::stdout());
    let mut captured = Vec::new();

    while let Some(line) = rx.recv().await {
        if let Some(out) = stdout.as_mut() {
            if let Err(e) = echo_line(out, &line).await {
                debug!("Echo to stdout failed, no longer echoing: {}", e);
                stdout = None;
            }
        }
        if let Some(w) = writer.as_mut() {
            if let Err(e) = write_line(w, &line).await {
                error!("Error writing capture file: {}", e);
                writer = None;
            }
        }
        if capture {
            captured.push(line);
        }
    }

    if let Some(mut out) = stdout {
        if let Err(e) = out.flush().await {
            debug!("Flushing stdout failed: {}", e);
        }
    }
    if let Some(mut w) = writer {
        if let Err(e) = w.flush().await {
            error!("Error flushing capture file: {}", e);
        }
    }
    debug!("Done reading buffered output");
    captured
}

async fn echo_line(out: &mut tokio::io::Stdout, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}

async fn write_line(writer: &mut BufWriter<tokio::fs::File>, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

/// SIGTERM the process group, then SIGKILL it if it is still alive.
async fn terminate(child: &mut Child) -> std::io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let pgid = Pid::from_raw(pid as i32);
            if let Err(e) = killpg(pgid, Signal::SIGTERM) {
                debug!("SIGTERM to process group {} failed: {}", pid, e);
            }
            if let Ok(status) = tokio::time::timeout(KILL_GRACE, child.wait()).await {
                // Leftover members of the group still hold our pipes.
                let _ = killpg(pgid, Signal::SIGKILL);
                return status;
            }
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!("SIGKILL to process group {} failed: {}", pid, e);
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!("Kill failed: {}", e);
    }
    child.wait().await
}

/// Map an exit status to a shell-style exit code.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Render a command line for logs.
pub fn command_line(program: &OsStr, args: &[String]) -> String {
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
