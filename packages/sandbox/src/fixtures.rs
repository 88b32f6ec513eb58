// ABOUTME: Read-only fixture store mapping a task id to its test material
// ABOUTME: Directory-backed implementation; absence is a per-submission error

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Result, SandboxError};

/// Read-only source of the fixed test material for a task.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Returns the fixture bytes for `task_id`, or
    /// [`SandboxError::FixtureMissing`] if the task has none.
    async fn load(&self, task_id: u64) -> Result<Vec<u8>>;
}

/// Fixture store over a directory tree: `<root>/<task_id>/<filename>`.
pub struct DirFixtureStore {
    root: PathBuf,
    filename: String,
}

impl DirFixtureStore {
    pub fn new(root: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            filename: filename.into(),
        }
    }

    fn fixture_path(&self, task_id: u64) -> PathBuf {
        self.root.join(task_id.to_string()).join(&self.filename)
    }
}

#[async_trait]
impl FixtureStore for DirFixtureStore {
    async fn load(&self, task_id: u64) -> Result<Vec<u8>> {
        let path = self.fixture_path(task_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SandboxError::FixtureMissing(task_id))
            }
            Err(e) => Err(SandboxError::Io(e)),
        }
    }
}
