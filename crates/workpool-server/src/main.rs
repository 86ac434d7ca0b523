#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::time::Duration;
use server::api::routes::{cors_layer, router};
use server::config::{CliArgs, ServerConfig};
use server::telemetry::{TelemetryProviders, init_telemetry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use workpool::{ShutdownOutcome, WorkerPool};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.log_level)?;

    let pool = Arc::new(WorkerPool::with_span(
        &config.pool,
        tracing::info_span!("pool", capacity = config.pool.queue_capacity),
    ));
    pool.add_workers(config.pool.initial_workers);

    let app = router(Arc::clone(&pool), cors_layer(config.cors_origin.clone()));
    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool, config.shutdown_timeout, providers))
        .await?;

    tracing::info!("Server exiting");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting worker pool server on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting worker pool server on {} with {} workers",
            config.server_addr,
            config.pool.initial_workers
        );
    }
}

async fn shutdown_signal(
    pool: Arc<WorkerPool>,
    shutdown_timeout: Duration,
    providers: TelemetryProviders,
) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutting down server...");

    // Cancel every worker and wait for them, escalating to closing the queue
    // if they do not exit in time.
    match pool.shutdown(shutdown_timeout).await {
        ShutdownOutcome::Graceful => tracing::info!("All workers stopped"),
        ShutdownOutcome::Forced => tracing::warn!(
            "Workers did not stop within {:?}; input queue was force-closed",
            shutdown_timeout
        ),
    }

    providers.shutdown();
}
