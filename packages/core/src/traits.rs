// ABOUTME: Trait seams for the pipeline's external collaborators
// ABOUTME: Job source (message queue) and diagnostics store (KV with expiry)

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DiagnosticRecord, Submission};

/// Errors surfaced by a [`JobSource`].
///
/// Malformed payloads are not an error: sources skip them with a logged
/// warning and keep reading. Only delivery-level problems reach the caller.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source delivered no more submissions and never will.
    #[error("job source closed")]
    Closed,

    /// The source cannot deliver submissions (connection loss, broker down).
    #[error("job source unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by a [`DiagnosticsStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("diagnostics store error: {0}")]
    Backend(String),
}

/// Delivers submissions one at a time with at-least-once semantics.
///
/// `next` blocks until a submission is available or delivery becomes
/// impossible. Callers compose it with their own cancellation.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn next(&self) -> Result<Submission, IngestError>;
}

/// Key-value store for failure diagnostics with per-record expiry.
///
/// Writes overwrite on conflict (last failure wins); there is no
/// transactional guarantee across keys.
#[async_trait]
pub trait DiagnosticsStore: Send + Sync {
    /// Persists `record` under its (task_id, user_id) key for `ttl`.
    async fn put(&self, record: &DiagnosticRecord, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the last recorded message for the key, or `None` if absent
    /// or expired.
    async fn get(&self, task_id: u64, user_id: u64) -> Result<Option<String>, StoreError>;
}
