// src/core/harness/invoker.rs

use super::workspace::Workspace;
use crate::core::error::HarnessError;
use crate::core::models::{ExecutionResult, StepResult, ToolCommand};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Runs one step of a tool command inside the workspace.
///
/// The default implementation spawns a real process; tests substitute a
/// scripted runner.
pub trait ToolRunner {
    async fn run_step(
        &self,
        step: &[&str],
        workspace: &Workspace,
    ) -> Result<StepResult, HarnessError>;
}

/// Spawns the step as a subprocess and tees its output.
///
/// Stdout and stderr are piped, relayed to the parent's own streams as soon as
/// bytes arrive, and captured for the report. Stdin is inherited.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner {
    /// Upper bound on a single step's runtime. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for ProcessRunner {
    async fn run_step(
        &self,
        step: &[&str],
        workspace: &Workspace,
    ) -> Result<StepResult, HarnessError> {
        let (program, args) = step.split_first().ok_or(HarnessError::EmptyCommand)?;
        let rendered = ToolCommand::render_step(step);
        debug!(command = %rendered, cwd = %workspace.root().display(), "Spawning tool.");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(workspace.root())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(program = %program, error = %source, "Failed to spawn tool.");
                HarnessError::ToolSpawn {
                    program: program.to_string(),
                    source,
                }
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = async {
            let (out, err) = tokio::join!(
                relay(stdout, tokio::io::stdout()),
                relay(stderr, tokio::io::stderr())
            );
            let status = child.wait().await;
            (out, err, status)
        };

        let (out, err, status) = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, finished).await {
                Ok(done) => done,
                Err(_) => {
                    // The child is killed when it drops on return.
                    warn!(
                        command = %rendered,
                        secs = limit.as_secs(),
                        "Tool timed out, killing it."
                    );
                    return Err(HarnessError::ToolTimedOut {
                        command: rendered,
                        secs: limit.as_secs(),
                    });
                }
            },
            None => finished.await,
        };

        let io_error = |source| HarnessError::ToolIo {
            program: program.to_string(),
            source,
        };
        let stdout = out.map_err(io_error)?;
        let stderr = err.map_err(io_error)?;
        let status = status.map_err(io_error)?;

        Ok(StepResult {
            command: rendered,
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Upper bound on the bytes kept per stream. The report only shows the last
/// few dozen lines, so older output is dropped as the tail grows.
pub const CAPTURE_LIMIT: usize = 64 * 1024;

/// The trailing bytes of a stream, cut at a line boundary.
#[derive(Debug, Default)]
struct Tail {
    bytes: Vec<u8>,
}

impl Tail {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
        // Trimmed only once twice the limit has accumulated.
        if self.bytes.len() > 2 * CAPTURE_LIMIT {
            let mut cut = self.bytes.len() - CAPTURE_LIMIT;
            if let Some(newline) = self.bytes[cut..].iter().position(|&b| b == b'\n') {
                cut += newline + 1;
            }
            self.bytes.drain(..cut);
        }
    }
}

/// Copies everything from `reader` to `sink` chunk by chunk, keeping the tail.
///
/// Losing the console does not fail the step: relaying stops and the output
/// is still captured for the report.
async fn relay<R, W>(reader: Option<R>, mut sink: W) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut tail = Tail::default();
    let Some(mut reader) = reader else {
        return Ok(tail.bytes);
    };
    let mut relaying = true;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if relaying {
            let written = async {
                sink.write_all(&buf[..n]).await?;
                sink.flush().await
            };
            if let Err(e) = written.await {
                warn!(error = %e, "Console closed, capturing tool output without relaying it.");
                relaying = false;
            }
        }
        tail.push(&buf[..n]);
    }
    Ok(tail.bytes)
}

/// Runs every step of `command` in order, stopping at the first step that
/// exits non-zero.
///
/// A non-zero exit is not an `Err`: it comes back inside the
/// `ExecutionResult` so the caller can still report the captured output.
/// Errors are reserved for steps that could not run to completion at all
/// (spawn failure, timeout, broken pipes).
pub async fn invoke(
    runner: &impl ToolRunner,
    command: &ToolCommand,
    workspace: &Workspace,
) -> Result<ExecutionResult, HarnessError> {
    info!(command = %command, "Invoking external tool.");
    let mut result = ExecutionResult {
        steps: Vec::new(),
        declared_steps: command.steps.len(),
    };
    for step in command.steps {
        let outcome = runner.run_step(step, workspace).await?;
        let stop = !outcome.success();
        info!(command = %outcome.command, code = ?outcome.code, "Step finished.");
        result.steps.push(outcome);
        if stop {
            break;
        }
    }
    Ok(result)
}
