use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskbench_db::store::{PgStore, TaskStore};
use taskbench_pipeline::{Dispatcher, ExecutionEngine};
use taskbench_worker::config::{Role, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskbench_worker=debug,taskbench_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(roles = ?config.roles, "Loaded worker configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = taskbench_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    taskbench_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    taskbench_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let store: Arc<dyn TaskStore> = Arc::new(PgStore::new(pool));

    // --- Pipeline roles ---
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    if config.roles.contains(&Role::Dispatcher) {
        let dispatcher = Dispatcher::new(Arc::clone(&store), config.dispatcher.clone());
        let token = cancel.clone();
        handles.push(tokio::spawn(async move {
            dispatcher.run(token).await;
        }));
    }

    if config.roles.contains(&Role::CpuEngine) {
        let engine = ExecutionEngine::cpu(Arc::clone(&store), config.cpu_engine.clone());
        let token = cancel.clone();
        handles.push(tokio::spawn(async move {
            engine.run(token).await;
        }));
    }

    if config.roles.contains(&Role::MemoryEngine) {
        let engine = ExecutionEngine::memory(Arc::clone(&store), config.memory_engine.clone());
        let token = cancel.clone();
        handles.push(tokio::spawn(async move {
            engine.run(token).await;
        }));
    }

    if handles.is_empty() {
        tracing::warn!("No roles enabled; set WORKER_ROLES to dispatcher,cpu,memory");
        return;
    }

    tracing::info!(count = handles.len(), "Worker roles started");

    // --- Shutdown ---
    shutdown_signal().await;
    cancel.cancel();

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Role task ended abnormally");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
