use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convertino_core::{
    create_authenticator, load_config, validate_config, Authenticator, CloudUploader,
    ConversionEngine, FfmpegTranscoder, HttpCloudUploader, ResultStore, SourceRoot,
    TranscoderSet, CONFIG_PATH_VAR,
};
use convertino_server::api::create_router;
use convertino_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often finished batches past their retention are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

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

    info!("Convertino v{}", VERSION);

    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {}", config.auth.method.as_str());

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method().as_str());

    // Transcoders. A missing ffmpeg is not fatal: affected jobs fail individually.
    let transcoders = TranscoderSet::new()
        .with(Arc::new(FfmpegTranscoder::new(config.converter.clone())));
    match transcoders.validate_all().await {
        Ok(()) => info!("Transcoders ready: {:?}", transcoders.names()),
        Err(e) => warn!("Transcoder check failed, conversions will fail: {}", e),
    }

    // Result store and engine
    let store = Arc::new(ResultStore::new(config.store.clone()));
    let engine = ConversionEngine::new(config.engine.clone(), transcoders, Arc::clone(&store));
    info!(
        "Conversion engine started (max {} concurrent jobs, artifact TTL {}s)",
        config.engine.max_concurrent_jobs, config.store.ttl_secs
    );

    // Background maintenance
    let shutdown = CancellationToken::new();
    let background = vec![
        store.spawn_sweeper(config.store.sweep_interval(), shutdown.clone()),
        engine.spawn_pruner(PRUNE_INTERVAL, shutdown.clone()),
    ];

    // Cloud hand-off if configured
    let cloud: Option<Arc<dyn CloudUploader>> = match &config.cloud {
        Some(cloud_config) => {
            info!("Initializing cloud uploader at {}", cloud_config.base_url());
            let uploader = HttpCloudUploader::new(cloud_config.clone())
                .context("Failed to create cloud uploader")?;
            Some(Arc::new(uploader))
        }
        None => {
            info!("No cloud storage configured");
            None
        }
    };

    // Create app state
    let mut state = AppState::new(config.clone(), authenticator, engine.clone(), cloud);
    match &config.server.source_dir {
        Some(dir) => {
            let root = SourceRoot::new(dir)
                .with_context(|| format!("Invalid server.source_dir {:?}", dir))?;
            info!("Server-local sources allowed under {:?}", root.path());
            state = state.with_source_root(root);
        }
        None => info!("Server-local sources disabled, uploads only"),
    }
    let state = Arc::new(state);

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutting down...");
    engine.cancel_all().await;
    shutdown.cancel();
    for result in futures::future::join_all(background).await {
        if let Err(e) = result {
            warn!("Background task ended abnormally: {}", e);
        }
    }
    info!("Background tasks stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
}
