// ABOUTME: Core types and collaborator traits for the grading pipeline
// ABOUTME: Shared domain model used by every other grader package

pub mod traits;
pub mod types;

// Re-export main types
pub use traits::{DiagnosticsStore, IngestError, JobSource, StoreError};
pub use types::{DiagnosticRecord, Outcome, Submission};
