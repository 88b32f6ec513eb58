// ABOUTME: Redis diagnostics store: SET with expiry, GET with nil mapped to None
// ABOUTME: Keys are diagnostic:<task>-<user>; a later write overwrites an earlier one

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::info;

use grader_core::{DiagnosticRecord, DiagnosticsStore, StoreError};

const KEY_PREFIX: &str = "diagnostic:";

/// Diagnostics store backed by Redis.
///
/// `ConnectionManager` reconnects under the hood, so a transient Redis
/// outage degrades to per-write errors instead of poisoning the handle.
pub struct RedisDiagnostics {
    conn: ConnectionManager,
}

impl RedisDiagnostics {
    /// Connects and pings, so a misconfigured address fails at startup
    /// rather than on the first write.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let mut conn = ConnectionManager::new(client).await.map_err(backend)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        info!("connected to diagnostics store");
        Ok(Self { conn })
    }

    fn key(task_id: u64, user_id: u64) -> String {
        format!("{KEY_PREFIX}{task_id}-{user_id}")
    }
}

#[async_trait]
impl DiagnosticsStore for RedisDiagnostics {
    async fn put(&self, record: &DiagnosticRecord, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(Self::key(record.task_id, record.user_id))
            .arg(&record.message)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, task_id: u64, user_id: u64) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let message: Option<String> = redis::cmd("GET")
            .arg(Self::key(task_id, user_id))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(message)
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}
