// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across the grader

// Job source (Kafka)
pub const GRADER_KAFKA_BROKERS: &str = "GRADER_KAFKA_BROKERS";
pub const GRADER_KAFKA_TOPIC: &str = "GRADER_KAFKA_TOPIC";
pub const GRADER_KAFKA_GROUP_ID: &str = "GRADER_KAFKA_GROUP_ID";

// Diagnostics store (Redis)
pub const GRADER_REDIS_URL: &str = "GRADER_REDIS_URL";
pub const GRADER_DIAGNOSTIC_TTL_SECS: &str = "GRADER_DIAGNOSTIC_TTL_SECS";

// Sandbox paths
pub const GRADER_FIXTURES_DIR: &str = "GRADER_FIXTURES_DIR";
pub const GRADER_SCRATCH_DIR: &str = "GRADER_SCRATCH_DIR";

// Sandbox execution
pub const GRADER_TEST_COMMAND: &str = "GRADER_TEST_COMMAND";
pub const GRADER_SOLUTION_FILENAME: &str = "GRADER_SOLUTION_FILENAME";
pub const GRADER_FIXTURE_FILENAME: &str = "GRADER_FIXTURE_FILENAME";
pub const GRADER_RUN_TIMEOUT_SECS: &str = "GRADER_RUN_TIMEOUT_SECS";
pub const GRADER_STDERR_LIMIT_BYTES: &str = "GRADER_STDERR_LIMIT_BYTES";

// Pipeline sizing
pub const GRADER_EXECUTION_WORKERS: &str = "GRADER_EXECUTION_WORKERS";
pub const GRADER_DIAGNOSTICS_WORKERS: &str = "GRADER_DIAGNOSTICS_WORKERS";
pub const GRADER_SUBMISSION_QUEUE: &str = "GRADER_SUBMISSION_QUEUE";
pub const GRADER_FAILURE_QUEUE: &str = "GRADER_FAILURE_QUEUE";
