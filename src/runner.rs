//! External tool process execution
//!
//! Spawns the download tool as a child process (stdin closed, stdout and
//! stderr piped) and exposes its combined output as a single interleaved
//! sequence of lines plus a terminal exit outcome. The [`ToolRunner`] trait
//! is the seam that lets tests substitute a scripted tool for the real
//! binary.
//!
//! Pipe chunks are not line-atomic: a read may contain several lines, or a
//! fragment of one. [`LineSplitter`] reassembles complete lines across
//! chunk boundaries, splitting on `\r?\n` and dropping empty fragments.
//!
//! The line channel is bounded. When the consumer falls behind, the reader
//! tasks await capacity instead of buffering unbounded memory; the stalled
//! read then backpressures the tool through the OS pipe.

use crate::error::{Error, Result};
use crate::types::ExitOutcome;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Name of the external download tool searched for in PATH
pub const TOOL_BINARY: &str = "yt-dlp";

/// Options controlling a single tool spawn
#[derive(Debug)]
pub struct SpawnOptions {
    /// Capacity of the bounded output line channel
    pub line_capacity: usize,
    /// Token fired when the observing client goes away
    pub cancel: CancellationToken,
    /// Kill the child when `cancel` fires; when false the child runs to
    /// completion unobserved
    pub kill_on_cancel: bool,
}

/// A spawned tool process, viewed as a line sequence plus an exit outcome
///
/// `lines` yields stdout and stderr interleaved in arrival order and closes
/// once both streams reach EOF. `exit` resolves exactly once, after the
/// process has been reaped.
#[derive(Debug)]
pub struct RunningTool {
    /// Interleaved, line-delimited tool output
    pub lines: mpsc::Receiver<String>,
    /// Terminal outcome of the process
    pub exit: oneshot::Receiver<ExitOutcome>,
}

/// Abstraction over launching the external download tool
///
/// One spawn attempt per job, no retries. Spawn failure (binary missing,
/// permission denied) is reported through [`Error::ToolSpawn`], distinct
/// from the tool running and exiting nonzero.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Spawn the tool with the given argument list
    async fn spawn(&self, args: &[String], options: SpawnOptions) -> Result<RunningTool>;

    /// Short identifier for logging
    fn name(&self) -> &'static str;
}

/// Runner that executes the real external binary
///
/// # Examples
///
/// ```no_run
/// use mediafetch::runner::CliToolRunner;
/// use std::path::PathBuf;
///
/// // Create with an explicit path
/// let runner = CliToolRunner::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let runner = CliToolRunner::from_path();
/// ```
pub struct CliToolRunner {
    binary_path: PathBuf,
}

impl CliToolRunner {
    /// Create a new runner with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find the tool in PATH
    pub fn from_path() -> Option<Self> {
        which::which(TOOL_BINARY).ok().map(Self::new)
    }

    /// Path of the binary this runner executes
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }
}

#[async_trait]
impl ToolRunner for CliToolRunner {
    async fn spawn(&self, args: &[String], options: SpawnOptions) -> Result<RunningTool> {
        let mut child = Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ToolSpawn(e.to_string()))?;

        tracing::info!(
            binary = %self.binary_path.display(),
            pid = child.id(),
            "spawned download tool"
        );

        let (line_tx, line_rx) = mpsc::channel(options.line_capacity.max(1));
        let (exit_tx, exit_rx) = oneshot::channel();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, line_tx));
        }

        let cancel = options.cancel;
        let kill_on_cancel = options.kill_on_cancel;
        tokio::spawn(async move {
            let outcome = tokio::select! {
                status = child.wait() => outcome_from_wait(status),
                _ = cancel.cancelled(), if kill_on_cancel => {
                    tracing::info!("client gone, killing download tool");
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(error = %e, "failed to kill download tool");
                    }
                    outcome_from_wait(child.wait().await)
                }
            };
            // Receiver may already be gone if the request was abandoned
            let _ = exit_tx.send(outcome);
        });

        Ok(RunningTool {
            lines: line_rx,
            exit: exit_rx,
        })
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }
}

fn outcome_from_wait(status: std::io::Result<std::process::ExitStatus>) -> ExitOutcome {
    match status {
        Ok(status) => ExitOutcome {
            success: status.success(),
            code: status.code(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to wait for download tool");
            ExitOutcome {
                success: false,
                code: None,
            }
        }
    }
}

/// Read a raw stream in chunks and forward complete lines to the channel
///
/// Awaits channel capacity on send; a closed channel ends the pump early.
async fn pump_lines<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::Sender<String>) {
    let mut splitter = LineSplitter::new();
    let mut chunk = [0u8; 4096];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for line in splitter.push(&chunk[..n]) {
                    if tx.send(line).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "tool output stream read failed");
                break;
            }
        }
    }

    if let Some(line) = splitter.finish() {
        let _ = tx.send(line).await;
    }
}

/// Reassembles complete lines from non-line-atomic byte chunks
///
/// Splits on `\n`, strips a trailing `\r`, and drops empty fragments. A
/// partial line at the end of a chunk is buffered until the next chunk (or
/// [`finish`](LineSplitter::finish)) completes it.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, yielding the complete lines it closes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for byte in chunk {
            if *byte == b'\n' {
                if let Some(line) = Self::take_line(&mut self.pending) {
                    lines.push(line);
                }
            } else {
                self.pending.push(*byte);
            }
        }

        lines
    }

    /// Flush any trailing partial line at end of stream
    pub fn finish(mut self) -> Option<String> {
        Self::take_line(&mut self.pending)
    }

    fn take_line(pending: &mut Vec<u8>) -> Option<String> {
        if pending.last() == Some(&b'\r') {
            pending.pop();
        }
        if pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(pending).into_owned();
        pending.clear();
        Some(line)
    }
}
