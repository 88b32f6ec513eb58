// ABOUTME: Two-stage shutdown signal: graceful drain, then forced abandonment

use tokio_util::sync::CancellationToken;

/// The pipeline's shutdown signal, broadcast to every blocking point.
///
/// The first request stops ingestion and lets queued and in-flight work
/// drain to completion. The second (forced) request abandons in-flight
/// work: worker loops stop dequeuing and running sandboxes are killed.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    graceful: CancellationToken,
    force: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful drain. Idempotent.
    pub fn request(&self) {
        self.graceful.cancel();
    }

    /// Abandon in-flight work. Implies a graceful request.
    pub fn force(&self) {
        self.graceful.cancel();
        self.force.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.graceful.is_cancelled()
    }

    pub(crate) fn graceful_token(&self) -> &CancellationToken {
        &self.graceful
    }

    pub(crate) fn force_token(&self) -> &CancellationToken {
        &self.force
    }
}
