// ABOUTME: Worker loops for the execution and diagnostics pools
// ABOUTME: Each worker processes one item per iteration; the pool size is the concurrency bound

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use grader_core::{DiagnosticRecord, DiagnosticsStore, Outcome, Submission};
use grader_sandbox::Runner;

/// Receiver end of a queue shared by all workers of one pool.
pub(crate) type SharedQueue<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Dequeues the next item, or `None` when the queue is closed and empty or
/// the forced shutdown fired. The lock is held only while waiting to
/// dequeue, never across item processing.
async fn next_item<T>(queue: &SharedQueue<T>, force: &CancellationToken) -> Option<T> {
    let mut rx = queue.lock().await;
    tokio::select! {
        biased;
        _ = force.cancelled() => None,
        item = rx.recv() => item,
    }
}

/// One execution pool worker: run submissions, route failures onward.
///
/// Runs the sandbox synchronously within the loop iteration, so the worker
/// count is the sole bound on concurrent sandbox sessions. Drains until
/// the submission queue is closed and empty; only a forced shutdown makes
/// it stop early.
pub(crate) async fn execution_worker(
    worker: usize,
    submissions: SharedQueue<Submission>,
    failures: mpsc::Sender<DiagnosticRecord>,
    runner: Arc<dyn Runner>,
    force: CancellationToken,
) {
    while let Some(submission) = next_item(&submissions, &force).await {
        let outcome = runner.run(&submission, &force).await;
        match outcome {
            Outcome::Success => {
                debug!(
                    worker,
                    task_id = submission.task_id,
                    user_id = submission.user_id,
                    "submission passed"
                );
            }
            Outcome::Cancelled => {
                debug!(
                    worker,
                    task_id = submission.task_id,
                    user_id = submission.user_id,
                    "submission cancelled by shutdown"
                );
            }
            Outcome::Failure { diagnostic } => {
                info!(
                    worker,
                    task_id = submission.task_id,
                    user_id = submission.user_id,
                    "submission failed"
                );
                let record = DiagnosticRecord::new(&submission, diagnostic);
                tokio::select! {
                    biased;
                    _ = force.cancelled() => break,
                    sent = failures.send(record) => {
                        if sent.is_err() {
                            warn!(worker, "failure queue closed, dropping diagnostic");
                        }
                    }
                }
            }
        }
    }
    debug!(worker, "execution worker stopped");
}

/// One diagnostics pool worker: persist failure records with a TTL.
///
/// Persistence errors are logged and dropped; losing a diagnostic is
/// acceptable, stalling the pool is not.
pub(crate) async fn diagnostics_worker(
    worker: usize,
    failures: SharedQueue<DiagnosticRecord>,
    store: Arc<dyn DiagnosticsStore>,
    ttl: Duration,
    force: CancellationToken,
) {
    while let Some(record) = next_item(&failures, &force).await {
        match store.put(&record, ttl).await {
            Ok(()) => {
                debug!(
                    worker,
                    task_id = record.task_id,
                    user_id = record.user_id,
                    "diagnostic recorded"
                );
            }
            Err(e) => {
                warn!(
                    worker,
                    task_id = record.task_id,
                    user_id = record.user_id,
                    error = %e,
                    "failed to persist diagnostic, dropping"
                );
            }
        }
    }
    debug!(worker, "diagnostics worker stopped");
}
