use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podclip_core::{
    load_config, load_config_from_env, validate_config, Config, FfmpegToolkit, JobOrchestrator,
    JobStatus, JobUpdateCallback,
};
use podclip_server::{create_router, AppState};

/// Config file used when `PODCLIP_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = read_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Upload directory: {:?}", config.storage.upload_dir);
    info!("Clip directory: {:?}", config.storage.output_dir);
    info!("Parallel clips: {}", config.jobs.max_parallel_clips);

    for dir in [&config.storage.upload_dir, &config.storage.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    let toolkit = Arc::new(FfmpegToolkit::new(
        config.transcoder.clone(),
        config.encoding.clone(),
    ));
    match toolkit.validate().await {
        Ok(()) => info!("ffmpeg and ffprobe available"),
        Err(e) => warn!("Media tools not usable, jobs will fail: {}", e),
    }

    let update_callback: JobUpdateCallback = Arc::new(|job_id: &str, status: JobStatus| {
        info!(job_id = %job_id, status = %status, "Job status changed");
    });

    let orchestrator = JobOrchestrator::new(
        config.jobs.clone(),
        config.storage.output_dir.clone(),
        toolkit.clone(),
        toolkit,
    )
    .with_update_callback(update_callback);

    let state = Arc::new(AppState::new(config.clone(), Arc::new(orchestrator)));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Loads `PODCLIP_CONFIG`, else `config.toml` when present, else defaults.
///
/// Environment overrides apply in every case.
fn read_config() -> Result<Config> {
    match std::env::var("PODCLIP_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No config file, using defaults and environment");
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
