//! Application entry point for the finger-spelling trainer server.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime.
//! 4. Spawn the progress recorder on the runtime.
//! 5. Build the tracking service over the replay capture backend.
//! 6. Serve the HTTP API until Ctrl-C, then stop tracking and let the
//!    recorder drain.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use fingerspell::{
    api::{router, ApiState},
    capture::ReplayBackend,
    config::AppConfig,
    exercise::{record_completions, ExerciseGenerator, JsonProgressStore, ProgressStore},
    pipeline::{snapshot_channel, TrackingService},
};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    // Progress recorder
    let store_dir = config.progress.resolved_store_dir();
    log::info!("progress records in {}", store_dir.display());
    let store: Arc<dyn ProgressStore> = Arc::new(JsonProgressStore::new(store_dir));
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let recorder = tokio::spawn(record_completions(
        completion_rx,
        Arc::clone(&store),
        config.progress.user_id.clone(),
    ));

    // Tracking service
    match &config.tracking.replay_script {
        Some(path) => log::info!("capture: replay script {}", path.display()),
        None => log::warn!("capture: no replay script configured; start-tracking will fail"),
    }
    let (publisher, _reader) = snapshot_channel();
    let tracking = Arc::new(TrackingService::new(
        Arc::new(ReplayBackend::from_config(&config.tracking)),
        config.tracking.clone(),
        publisher,
        completion_tx,
    ));

    let state = ApiState {
        tracking: Arc::clone(&tracking),
        progress: store,
        generator: Arc::new(ExerciseGenerator::from_config(&config.content)),
        user_id: Arc::from(config.progress.user_id.as_str()),
    };

    // HTTP
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    log::info!("listening on http://{}", config.server.bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Shutdown: stop the worker, then drop the last completion sender so the
    // recorder finishes its queue.
    let stopping = Arc::clone(&tracking);
    if let Err(e) = tokio::task::spawn_blocking(move || stopping.stop()).await? {
        log::error!("tracking: {e}");
    }
    drop(tracking);
    recorder.await.context("progress recorder failed")?;

    log::info!("bye");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("fingerspell starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.tracking.validate()?;

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(serve(config))
}
