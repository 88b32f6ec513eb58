// ABOUTME: Typed configuration for the grader, loaded from the environment
// ABOUTME: Parses and validates every knob once at startup; no global mutable state

pub mod constants;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} must be at least 1")]
    Zero { name: &'static str },

    #[error("{name} must not be empty")]
    Empty { name: &'static str },
}

/// Everything the grader needs to run, resolved once at startup.
///
/// Constructed from the environment and handed to the pipeline and its
/// collaborators by value; nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub kafka_brokers: Vec<String>,
    pub kafka_topic: String,
    pub kafka_group_id: String,

    pub redis_url: String,
    pub diagnostic_ttl: Duration,

    pub fixtures_dir: PathBuf,
    pub scratch_dir: PathBuf,

    pub test_command: Vec<String>,
    pub solution_filename: String,
    pub fixture_filename: String,
    pub run_timeout: Duration,
    pub stderr_limit: usize,

    pub execution_workers: usize,
    pub diagnostics_workers: usize,
    pub submission_queue: usize,
    pub failure_queue: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let kafka_brokers = list_var(GRADER_KAFKA_BROKERS, "localhost:9092")?;
        let kafka_topic = string_var(GRADER_KAFKA_TOPIC, "tasks")?;
        let kafka_group_id = string_var(GRADER_KAFKA_GROUP_ID, "task-consumer")?;

        let redis_url = string_var(GRADER_REDIS_URL, "redis://127.0.0.1:6379/0")?;
        let diagnostic_ttl =
            Duration::from_secs(positive_var(GRADER_DIAGNOSTIC_TTL_SECS, 30 * 60)?);

        let fixtures_dir = PathBuf::from(string_var(
            GRADER_FIXTURES_DIR,
            "/var/lib/grader/fixtures",
        )?);
        let scratch_dir = match env::var(GRADER_SCRATCH_DIR) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => env::temp_dir(),
        };

        let test_command = list_space_var(GRADER_TEST_COMMAND, "go test")?;
        let solution_filename = string_var(GRADER_SOLUTION_FILENAME, "solution.go")?;
        let fixture_filename = string_var(GRADER_FIXTURE_FILENAME, "main_test.go")?;
        let run_timeout = Duration::from_secs(positive_var(GRADER_RUN_TIMEOUT_SECS, 10)?);
        let stderr_limit = positive_var(GRADER_STDERR_LIMIT_BYTES, 64 * 1024)? as usize;

        let execution_workers = positive_var(GRADER_EXECUTION_WORKERS, 10)? as usize;
        let diagnostics_workers = positive_var(GRADER_DIAGNOSTICS_WORKERS, 3)? as usize;
        let submission_queue = positive_var(GRADER_SUBMISSION_QUEUE, 32)? as usize;
        let failure_queue = positive_var(GRADER_FAILURE_QUEUE, 32)? as usize;

        Ok(Config {
            kafka_brokers,
            kafka_topic,
            kafka_group_id,
            redis_url,
            diagnostic_ttl,
            fixtures_dir,
            scratch_dir,
            test_command,
            solution_filename,
            fixture_filename,
            run_timeout,
            stderr_limit,
            execution_workers,
            diagnostics_workers,
            submission_queue,
            failure_queue,
        })
    }
}

fn string_var(name: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    Ok(value)
}

/// Comma-separated list, e.g. `broker-1:9092,broker-2:9092`.
fn list_var(name: &'static str, default: &str) -> Result<Vec<String>, ConfigError> {
    let value = string_var(name, default)?;
    let items: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    Ok(items)
}

/// Whitespace-separated argv, e.g. `go test`.
fn list_space_var(name: &'static str, default: &str) -> Result<Vec<String>, ConfigError> {
    let value = string_var(name, default)?;
    let items: Vec<String> = value.split_whitespace().map(|s| s.to_string()).collect();
    if items.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    Ok(items)
}

fn positive_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(name) {
        Ok(raw) => u64::from_str(raw.trim()).map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        })?,
        Err(_) => default,
    };
    if value == 0 {
        return Err(ConfigError::Zero { name });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // from_env reads the whole environment, so tests serialize around it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_grader_vars() {
        let names: Vec<String> = env::vars()
            .map(|(name, _)| name)
            .filter(|name| name.starts_with("GRADER_"))
            .collect();
        for name in names {
            env::remove_var(name);
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_grader_vars();

        let config = Config::from_env().unwrap();
        assert_eq!(config.kafka_brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(config.kafka_topic, "tasks");
        assert_eq!(config.kafka_group_id, "task-consumer");
        assert_eq!(config.run_timeout, Duration::from_secs(10));
        assert_eq!(config.diagnostic_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.execution_workers, 10);
        assert_eq!(config.diagnostics_workers, 3);
        assert_eq!(config.test_command, vec!["go".to_string(), "test".to_string()]);
    }

    #[test]
    fn broker_list_splits_on_commas() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_grader_vars();
        env::set_var(GRADER_KAFKA_BROKERS, "a:9092, b:9092 ,,c:9092");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.kafka_brokers,
            vec!["a:9092".to_string(), "b:9092".to_string(), "c:9092".to_string()]
        );
        env::remove_var(GRADER_KAFKA_BROKERS);
    }

    #[test]
    fn rejects_non_numeric_worker_count() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_grader_vars();
        env::set_var(GRADER_EXECUTION_WORKERS, "many");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == GRADER_EXECUTION_WORKERS));
        env::remove_var(GRADER_EXECUTION_WORKERS);
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_grader_vars();
        env::set_var(GRADER_SUBMISSION_QUEUE, "0");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Zero { name } if name == GRADER_SUBMISSION_QUEUE));
        env::remove_var(GRADER_SUBMISSION_QUEUE);
    }

    #[test]
    fn test_command_splits_on_whitespace() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_grader_vars();
        env::set_var(GRADER_TEST_COMMAND, "cargo test --offline");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.test_command,
            vec!["cargo".to_string(), "test".to_string(), "--offline".to_string()]
        );
        env::remove_var(GRADER_TEST_COMMAND);
    }
}
