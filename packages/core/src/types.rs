// ABOUTME: Domain types for the grading pipeline
// ABOUTME: Submissions, execution outcomes, and derived diagnostic records

use serde::{Deserialize, Serialize};

/// One code artifact to be graded, tied to a task and a user.
///
/// Fields are immutable after creation. A submission is consumed exactly
/// once by the execution pool and reaches exactly one terminal [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub task_id: u64,
    pub user_id: u64,
    pub code: String,
}

impl Submission {
    pub fn new(task_id: u64, user_id: u64, code: impl Into<String>) -> Self {
        Self {
            task_id,
            user_id,
            code: code.into(),
        }
    }
}

/// Terminal outcome of executing one submission.
///
/// `Cancelled` means shutdown preempted the run. It is not a failure and is
/// never recorded as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure { diagnostic: String },
    Cancelled,
}

impl Outcome {
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Outcome::Failure {
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

/// The failure record derived from a submission, persisted with a TTL.
///
/// Keyed by (task_id, user_id); a later write for the same key overwrites
/// the earlier one. The originating submission is never mutated to carry
/// the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub task_id: u64,
    pub user_id: u64,
    pub message: String,
}

impl DiagnosticRecord {
    pub fn new(submission: &Submission, message: impl Into<String>) -> Self {
        Self {
            task_id: submission.task_id,
            user_id: submission.user_id,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_payload_round_trips() {
        let json = r#"{"task_id":7,"user_id":3,"code":"fn main() {}"}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.task_id, 7);
        assert_eq!(submission.user_id, 3);
        assert_eq!(submission.code, "fn main() {}");
    }

    #[test]
    fn diagnostic_record_copies_submission_key() {
        let submission = Submission::new(7, 3, "loop {}");
        let record = DiagnosticRecord::new(&submission, "timeout");
        assert_eq!(record.task_id, 7);
        assert_eq!(record.user_id, 3);
        assert_eq!(record.message, "timeout");
        // The submission itself is untouched.
        assert_eq!(submission.code, "loop {}");
    }

    #[test]
    fn outcome_failure_helper() {
        let outcome = Outcome::failure("boom");
        assert!(outcome.is_failure());
        assert!(!Outcome::Success.is_failure());
        assert!(!Outcome::Cancelled.is_failure());
    }
}
