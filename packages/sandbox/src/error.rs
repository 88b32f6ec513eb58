// ABOUTME: Error types for sandbox setup and execution
// ABOUTME: Setup errors map to Failure outcomes at the runner boundary, never crashes

use thiserror::Error;

/// Errors raised while preparing or launching a sandbox session.
///
/// These never escape the runner: every variant is folded into a
/// `Failure` outcome carrying the error text as its diagnostic.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// No fixture exists for the submission's task.
    #[error("fixture missing for task {0}")]
    FixtureMissing(u64),

    /// Filesystem or subprocess-spawn failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured test command has no program to run.
    #[error("test command is empty")]
    EmptyCommand,
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
