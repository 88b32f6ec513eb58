// ABOUTME: Pipeline orchestrator: wires queues to pools and owns ordered shutdown
// ABOUTME: Never returns while a dequeued submission or diagnostic is still in flight

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use grader_core::{DiagnosticsStore, IngestError, JobSource, Submission};
use grader_sandbox::Runner;

use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::workers::{diagnostics_worker, execution_worker};

/// Sizing for the pipeline's pools and queues.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent sandbox sessions (execution pool size).
    pub execution_workers: usize,
    /// Concurrent diagnostics writers.
    pub diagnostics_workers: usize,
    /// Submission queue capacity; a full queue blocks ingestion.
    pub submission_queue: usize,
    /// Failure queue capacity.
    pub failure_queue: usize,
    /// Retention window for persisted diagnostics.
    pub diagnostic_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            execution_workers: 10,
            diagnostics_workers: 3,
            submission_queue: 32,
            failure_queue: 32,
            diagnostic_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// The grading pipeline.
///
/// Data flow: job source -> submission queue -> execution pool ->
/// failure queue -> diagnostics pool -> diagnostics store. The two queues
/// are the only shared mutable state between workers.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn JobSource>,
    store: Arc<dyn DiagnosticsStore>,
    runner: Arc<dyn Runner>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn JobSource>,
        store: Arc<dyn DiagnosticsStore>,
        runner: Arc<dyn Runner>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            runner,
        }
    }

    /// Runs the pipeline until the job source ends or shutdown is
    /// requested, then drains.
    ///
    /// Shutdown order: ingestion stops, the submission queue closes, the
    /// execution pool drains and joins, the failure queue closes, the
    /// diagnostics pool drains and joins. Returns only after every
    /// dequeued item reached a terminal state. A transport-level source
    /// error also takes this path and is returned after the drain.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), PipelineError> {
        let (submission_tx, submission_rx) =
            mpsc::channel::<Submission>(self.config.submission_queue.max(1));
        let (failure_tx, failure_rx) = mpsc::channel(self.config.failure_queue.max(1));
        let submission_rx = Arc::new(Mutex::new(submission_rx));
        let failure_rx = Arc::new(Mutex::new(failure_rx));

        let mut execution_pool = JoinSet::new();
        for worker in 0..self.config.execution_workers.max(1) {
            execution_pool.spawn(execution_worker(
                worker,
                Arc::clone(&submission_rx),
                failure_tx.clone(),
                Arc::clone(&self.runner),
                shutdown.force_token().clone(),
            ));
        }
        // Workers hold the only failure senders from here on; the queue
        // closes when the last worker exits.
        drop(failure_tx);

        let mut diagnostics_pool = JoinSet::new();
        for worker in 0..self.config.diagnostics_workers.max(1) {
            diagnostics_pool.spawn(diagnostics_worker(
                worker,
                Arc::clone(&failure_rx),
                Arc::clone(&self.store),
                self.config.diagnostic_ttl,
                shutdown.force_token().clone(),
            ));
        }

        info!(
            execution_workers = self.config.execution_workers,
            diagnostics_workers = self.config.diagnostics_workers,
            submission_queue = self.config.submission_queue,
            failure_queue = self.config.failure_queue,
            "pipeline started"
        );

        // `ingest` owns the submission sender; the queue closes the moment
        // it returns, which is what lets the execution pool finish.
        let ingest_result = self.ingest(submission_tx, &shutdown).await;

        while execution_pool.join_next().await.is_some() {}
        debug!("execution pool drained");
        while diagnostics_pool.join_next().await.is_some() {}
        debug!("diagnostics pool drained");

        info!("pipeline stopped");
        ingest_result.map_err(PipelineError::from)
    }

    /// Pulls submissions from the job source into the submission queue
    /// until shutdown, source close, or a transport error.
    ///
    /// Read errors are terminal: ingestion halts rather than retrying
    /// with backoff. A full queue blocks the pull loop (admission
    /// control); a shutdown request during that wait abandons the
    /// not-yet-enqueued submission to at-least-once redelivery.
    async fn ingest(
        &self,
        queue: mpsc::Sender<Submission>,
        shutdown: &Shutdown,
    ) -> Result<(), IngestError> {
        let graceful = shutdown.graceful_token();
        loop {
            let submission = tokio::select! {
                biased;
                _ = graceful.cancelled() => {
                    info!("shutdown requested, ingestion stopped");
                    return Ok(());
                }
                next = self.source.next() => match next {
                    Ok(submission) => submission,
                    Err(IngestError::Closed) => {
                        info!("job source closed, ingestion stopped");
                        return Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "job source failed, ingestion halted");
                        return Err(e);
                    }
                },
            };

            let (task_id, user_id) = (submission.task_id, submission.user_id);
            debug!(task_id, user_id, "submission received");

            tokio::select! {
                biased;
                _ = graceful.cancelled() => {
                    warn!(
                        task_id,
                        user_id,
                        "shutdown while enqueueing; submission left to redelivery"
                    );
                    return Ok(());
                }
                sent = queue.send(submission) => {
                    if sent.is_err() {
                        // All workers gone; nothing left to enqueue into.
                        warn!("submission queue closed, ingestion stopped");
                        return Ok(());
                    }
                }
            }
        }
    }
}
