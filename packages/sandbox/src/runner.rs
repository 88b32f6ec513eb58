// ABOUTME: Sandbox runner: one isolated scratch directory + one deadline-bound subprocess
// ABOUTME: Every invocation owns its session exclusively and removes it on every exit path

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use grader_core::{Outcome, Submission};

use crate::error::{Result, SandboxError};
use crate::fixtures::FixtureStore;

/// Synthetic diagnostic recorded when a run exceeds its deadline.
const TIMEOUT_DIAGNOSTIC: &str = "timeout";

/// Executes one submission to a terminal [`Outcome`].
///
/// Implementations must guarantee that whatever resources a run acquires
/// are released before `run` returns, on every path.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, submission: &Submission, cancel: &CancellationToken) -> Outcome;
}

/// Configuration for [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory under which per-run scratch directories are created.
    pub scratch_root: PathBuf,
    /// The opaque test command, run with the scratch directory as its
    /// working directory.
    pub command: Vec<String>,
    /// Wall-clock deadline per submission.
    pub timeout: Duration,
    /// Filename the submission's code is materialized under.
    pub solution_filename: String,
    /// Filename the task fixture is materialized under.
    pub fixture_filename: String,
    /// Captured stderr is truncated beyond this many bytes.
    pub stderr_limit: usize,
}

/// Runs submissions as subprocesses inside ephemeral scratch directories.
///
/// Isolation is directory-level: the command's working directory is the
/// scratch directory, and the runner itself never touches anything outside
/// it. Stronger isolation (namespaces, cgroups) is the command's own
/// concern.
pub struct ProcessRunner {
    config: RunnerConfig,
    fixtures: Arc<dyn FixtureStore>,
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig, fixtures: Arc<dyn FixtureStore>) -> Result<Self> {
        if config.command.is_empty() {
            return Err(SandboxError::EmptyCommand);
        }
        Ok(Self { config, fixtures })
    }

    /// Everything between scratch creation and outcome mapping. Setup
    /// errors bubble out as `Err` and become `Failure` in `run`.
    async fn execute(
        &self,
        submission: &Submission,
        cancel: &CancellationToken,
        scratch: &Path,
    ) -> Result<Outcome> {
        let fixture = self.fixtures.load(submission.task_id).await?;

        tokio::fs::write(
            scratch.join(&self.config.solution_filename),
            submission.code.as_bytes(),
        )
        .await?;
        tokio::fs::write(scratch.join(&self.config.fixture_filename), &fixture).await?;

        // Last checkpoint before the subprocess exists.
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let mut child = Command::new(&self.config.command[0])
            .args(&self.config.command[1..])
            .current_dir(scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr pipe not captured"))?;
        let limit = self.config.stderr_limit as u64;
        let capture = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.take(limit).read_to_end(&mut buf).await;
            buf
        });

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::time::sleep(self.config.timeout) => {
                kill_and_reap(&mut child).await;
                return Ok(Outcome::failure(TIMEOUT_DIAGNOSTIC));
            }
            _ = cancel.cancelled() => {
                kill_and_reap(&mut child).await;
                return Ok(Outcome::Cancelled);
            }
        };

        if status.success() {
            return Ok(Outcome::Success);
        }

        let captured = capture.await.unwrap_or_default();
        let text = String::from_utf8_lossy(&captured).trim().to_string();
        let diagnostic = if text.is_empty() {
            describe_status(status)
        } else {
            text
        };
        Ok(Outcome::Failure { diagnostic })
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, submission: &Submission, cancel: &CancellationToken) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        // The scratch directory is an RAII guard: it is removed recursively
        // when this function returns, whatever path got us there.
        let scratch = match tempfile::Builder::new()
            .prefix(&format!("{}-{}-", submission.task_id, submission.user_id))
            .tempdir_in(&self.config.scratch_root)
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!(
                    task_id = submission.task_id,
                    user_id = submission.user_id,
                    error = %e,
                    "failed to create scratch directory"
                );
                return Outcome::failure(format!("scratch directory: {e}"));
            }
        };

        debug!(
            task_id = submission.task_id,
            user_id = submission.user_id,
            scratch = %scratch.path().display(),
            "sandbox session started"
        );

        let outcome = match self.execute(submission, cancel, scratch.path()).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failure(e.to_string()),
        };

        if let Err(e) = scratch.close() {
            warn!(
                task_id = submission.task_id,
                user_id = submission.user_id,
                error = %e,
                "failed to remove scratch directory"
            );
        }
        outcome
    }
}

async fn kill_and_reap(child: &mut tokio::process::Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to kill sandboxed command");
    }
    let _ = child.wait().await;
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}
