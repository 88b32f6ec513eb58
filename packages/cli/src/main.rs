use std::sync::Arc;

use tracing::{info, warn};

use grader_config::Config;
use grader_diagnostics::RedisDiagnostics;
use grader_ingest::KafkaJobSource;
use grader_pipeline::{Pipeline, PipelineConfig, Shutdown};
use grader_sandbox::{DirFixtureStore, ProcessRunner, RunnerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    info!(
        brokers = %config.kafka_brokers.join(","),
        topic = %config.kafka_topic,
        group_id = %config.kafka_group_id,
        execution_workers = config.execution_workers,
        "starting grader"
    );

    let source = Arc::new(KafkaJobSource::new(
        &config.kafka_brokers,
        &config.kafka_topic,
        &config.kafka_group_id,
    )?);
    let store = Arc::new(RedisDiagnostics::connect(&config.redis_url).await?);
    let fixtures = Arc::new(DirFixtureStore::new(
        config.fixtures_dir.clone(),
        config.fixture_filename.clone(),
    ));
    let runner = Arc::new(ProcessRunner::new(
        RunnerConfig {
            scratch_root: config.scratch_dir.clone(),
            command: config.test_command.clone(),
            timeout: config.run_timeout,
            solution_filename: config.solution_filename.clone(),
            fixture_filename: config.fixture_filename.clone(),
            stderr_limit: config.stderr_limit,
        },
        fixtures,
    )?);

    let pipeline = Pipeline::new(
        PipelineConfig {
            execution_workers: config.execution_workers,
            diagnostics_workers: config.diagnostics_workers,
            submission_queue: config.submission_queue,
            failure_queue: config.failure_queue,
            diagnostic_ttl: config.diagnostic_ttl,
        },
        source,
        store,
        runner,
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    pipeline.run(shutdown).await?;
    info!("grader stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// First signal requests a graceful drain; a second one abandons
/// in-flight work.
fn spawn_signal_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        if shutdown_signal().await.is_err() {
            return;
        }
        info!("shutdown signal received, draining in-flight work (send again to force)");
        shutdown.request();

        if shutdown_signal().await.is_ok() {
            warn!("second shutdown signal, abandoning in-flight work");
            shutdown.force();
        }
    });
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
