use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casetrace_core::crypto::IpCipher;
use casetrace_sessions::{
    CleanupBackfill, DeletionScheduler, InMemoryRevocationCache, InactivityChecker, JobRunner,
    JobScheduler, NoGeoResolver, PgJobQueue, PgRevocationStore, PgSessionStore, RevocationSync,
    SessionJob, SessionReaper, SessionTracker,
};

mod config;

use config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casetrace_worker=debug,casetrace_sessions=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        schedule_checks = config.schedule_checks,
        revocation_sync_secs = config.revocation_sync_secs,
        "Loaded worker configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = casetrace_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    casetrace_db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Queue and stores ---
    let queue = Arc::new(PgJobQueue::new(pool.clone()));
    let session_store = Arc::new(PgSessionStore::new(pool.clone()));
    let revocation_store = Arc::new(PgRevocationStore::new(pool.clone()));
    let revocation_cache = Arc::new(InMemoryRevocationCache::new());

    // --- One-shot operator command ---
    // `casetrace-worker trigger-cleanup` enqueues a cleanup backfill for a
    // running worker to pick up, then exits.
    if let Some(command) = std::env::args().nth(1) {
        match command.as_str() {
            "trigger-cleanup" => {
                queue
                    .enqueue(&SessionJob::TriggerCleanup, None)
                    .await
                    .expect("Failed to enqueue cleanup backfill");
                tracing::info!("Cleanup backfill enqueued");
                return;
            }
            other => {
                eprintln!("Unknown command: {other}");
                std::process::exit(2);
            }
        }
    }

    // --- Handlers ---
    let cipher = IpCipher::from_hex_key(&config.ip_encryption_key)
        .expect("IP_ENCRYPTION_KEY must be a 64-char hex string");
    let tracker = SessionTracker::new(
        session_store.clone(),
        queue.clone(),
        Arc::new(NoGeoResolver),
        cipher,
        config.schedule_checks,
    );
    let checker = InactivityChecker::new(session_store.clone(), queue.clone());
    let deletion = DeletionScheduler::new(queue.clone());
    let reaper = SessionReaper::new(session_store.clone());
    let sync = RevocationSync::new(revocation_store, revocation_cache);
    let backfill = CleanupBackfill::new(session_store, queue.clone());

    let runner = JobRunner::new(queue.clone(), tracker, checker, deletion, reaper, sync, backfill);

    // --- Background tasks ---
    let cancel = tokio_util::sync::CancellationToken::new();

    let runner_cancel = cancel.clone();
    let runner_handle = tokio::spawn(async move {
        runner.run(runner_cancel).await;
    });

    let ticker_cancel = cancel.clone();
    let ticker_handle = tokio::spawn(casetrace_sessions::run_ticker(
        queue,
        Duration::from_secs(config.revocation_sync_secs),
        ticker_cancel,
    ));

    tracing::info!("Worker started (job runner, revocation sync ticker)");

    // --- Shutdown ---
    shutdown_signal().await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), runner_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), ticker_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker shuts
/// down cleanly whether stopped interactively or by a process manager.
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
