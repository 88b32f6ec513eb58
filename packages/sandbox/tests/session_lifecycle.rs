// ABOUTME: Integration tests for the full sandbox session lifecycle
// ABOUTME: Verifies scratch isolation and cleanup across every terminal path

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use grader_core::{Outcome, Submission};
use grader_sandbox::{DirFixtureStore, ProcessRunner, Runner, RunnerConfig};

/// Builds a fixture tree with one task whose fixture is a shell snippet,
/// and a runner that executes the materialized solution with `sh`.
fn setup(
    fixtures_root: &Path,
    scratch_root: &Path,
    task_id: u64,
    fixture_body: &str,
    timeout: Duration,
) -> ProcessRunner {
    let task_dir = fixtures_root.join(task_id.to_string());
    std::fs::create_dir_all(&task_dir).unwrap();
    std::fs::write(task_dir.join("fixture.sh"), fixture_body).unwrap();

    let store = Arc::new(DirFixtureStore::new(fixtures_root, "fixture.sh"));
    let config = RunnerConfig {
        scratch_root: scratch_root.to_path_buf(),
        command: vec!["sh".to_string(), "solution.sh".to_string()],
        timeout,
        solution_filename: "solution.sh".to_string(),
        fixture_filename: "fixture.sh".to_string(),
        stderr_limit: 64 * 1024,
    };
    ProcessRunner::new(config, store).unwrap()
}

fn entries(root: &Path) -> usize {
    std::fs::read_dir(root).unwrap().count()
}

#[tokio::test]
async fn session_materializes_both_files_and_cleans_up() {
    let fixtures = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    // The solution proves both files were materialized next to each other
    // before exiting.
    let runner = setup(
        fixtures.path(),
        scratch.path(),
        7,
        "# fixture marker",
        Duration::from_secs(10),
    );
    let submission = Submission::new(7, 3, "test -f solution.sh && grep -q marker fixture.sh");

    let outcome = runner.run(&submission, &CancellationToken::new()).await;
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
async fn scratch_directory_is_gone_after_every_terminal_path() {
    let fixtures = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let runner = setup(
        fixtures.path(),
        scratch.path(),
        7,
        "",
        Duration::from_millis(300),
    );

    // Success, failure, and timeout, one after another.
    let cases = [
        ("exit 0", Outcome::Success),
        ("echo no >&2; exit 1", Outcome::failure("no")),
        ("sleep 30", Outcome::failure("timeout")),
    ];
    for (code, expected) in cases {
        let outcome = runner
            .run(&Submission::new(7, 3, code), &CancellationToken::new())
            .await;
        assert_eq!(outcome, expected);
        assert_eq!(entries(scratch.path()), 0, "leaked scratch after {code:?}");
    }

    // Forced cancellation mid-run.
    let cancel = CancellationToken::new();
    let killer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        killer.cancel();
    });
    let runner = setup(
        fixtures.path(),
        scratch.path(),
        7,
        "",
        Duration::from_secs(30),
    );
    let outcome = runner.run(&Submission::new(7, 3, "sleep 30"), &cancel).await;
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
async fn concurrent_sessions_for_the_same_key_do_not_collide() {
    let fixtures = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let runner = Arc::new(setup(
        fixtures.path(),
        scratch.path(),
        7,
        "",
        Duration::from_secs(10),
    ));

    // Same (task, user) pair running many times at once; unique scratch
    // suffixes keep the sessions apart.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let runner = Arc::clone(&runner);
        handles.push(tokio::spawn(async move {
            runner
                .run(
                    &Submission::new(7, 3, "sleep 0.1; exit 0"),
                    &CancellationToken::new(),
                )
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Outcome::Success);
    }
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
async fn absent_fixture_directory_yields_fixture_missing() {
    let fixtures = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = Arc::new(DirFixtureStore::new(fixtures.path(), "fixture.sh"));
    let config = RunnerConfig {
        scratch_root: scratch.path().to_path_buf(),
        command: vec!["sh".to_string(), "solution.sh".to_string()],
        timeout: Duration::from_secs(10),
        solution_filename: "solution.sh".to_string(),
        fixture_filename: "fixture.sh".to_string(),
        stderr_limit: 64 * 1024,
    };
    let runner = ProcessRunner::new(config, store).unwrap();

    let outcome = runner
        .run(&Submission::new(999, 3, "exit 0"), &CancellationToken::new())
        .await;
    match outcome {
        Outcome::Failure { diagnostic } => {
            assert!(diagnostic.contains("fixture missing for task 999"))
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(entries(scratch.path()), 0);
}
