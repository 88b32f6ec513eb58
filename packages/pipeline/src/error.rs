use thiserror::Error;

use grader_core::IngestError;

/// Terminal pipeline failures.
///
/// Per-submission problems never surface here; they are folded into
/// outcomes and diagnostics. Only a broken job source ends a run with an
/// error, and even then the pipeline drains in-flight work first.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("ingestion halted: {0}")]
    Ingest(#[from] IngestError),
}
