// ABOUTME: Concurrent execution pipeline: pools, queues, and ordered shutdown
// ABOUTME: job source -> submission queue -> execution pool -> failure queue -> diagnostics pool

pub mod error;
pub mod pipeline;
pub mod shutdown;
mod workers;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineConfig};
pub use shutdown::Shutdown;
