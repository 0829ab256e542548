use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stemsplit_core::{
    create_authenticator, load_config, validate_config, Authenticator, ExpirySweeper,
    FfmpegEncoder, FsSessionStore, HttpSeparationWorker, ObjectStore, QuotaLedger,
    SeparationWorker, SessionOrchestrator, SessionRegistry, SessionStore, SqliteQuotaLedger,
    SqliteSessionRegistry, StemPackager, SupabaseStorageClient, SweeperRunner,
};

use stemsplit_server::api::create_router;
use stemsplit_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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

    // Determine config path
    let config_path = std::env::var("STEMSPLIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);
    info!("Session data dir: {:?}", config.sessions.data_dir);

    // Config fingerprint so deployments can be told apart in logs
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "stemsplit v{} starting (config {})",
        VERSION,
        &config_hash[..16]
    );

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Quota ledger and session registry share the SQLite database
    let ledger: Arc<dyn QuotaLedger> = Arc::new(
        SqliteQuotaLedger::new(&config.database.path, config.quota.clone())
            .context("Failed to create quota ledger")?,
    );
    info!("Quota ledger initialized");

    let registry: Arc<dyn SessionRegistry> = Arc::new(
        SqliteSessionRegistry::new(&config.database.path)
            .context("Failed to create session registry")?,
    );
    info!("Session registry initialized");

    // Local session storage
    let store: Arc<dyn SessionStore> = Arc::new(FsSessionStore::new(&config.sessions));

    // Remote separation worker client
    let worker: Arc<dyn SeparationWorker> =
        Arc::new(HttpSeparationWorker::new(config.worker.clone()));
    info!("Separation worker at {}", config.worker.url);

    // Optional remote object storage (holds uploaded session artifacts)
    let object_store: Option<Arc<dyn ObjectStore>> = match &config.storage {
        Some(storage_config) => {
            info!(
                "Object storage at {} (bucket: {})",
                storage_config.url, storage_config.bucket
            );
            Some(Arc::new(SupabaseStorageClient::new(storage_config.clone())))
        }
        None => {
            info!("No object storage configured");
            None
        }
    };

    // Packaging service (stem conversion + archives)
    let encoder = Arc::new(FfmpegEncoder::new(config.packaging.clone()));
    let packager = Arc::new(StemPackager::new(config.packaging.clone(), encoder));

    // Session orchestrator
    let orchestrator = Arc::new(SessionOrchestrator::new(
        config.orchestrator.clone(),
        Arc::clone(&ledger),
        worker,
        Arc::clone(&store),
        Arc::clone(&registry),
        object_store.clone(),
        packager,
    ));
    info!("Session orchestrator initialized");

    // Expiry sweeper and its background loop
    let sweeper = Arc::new(ExpirySweeper::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        object_store,
    ));
    let sweeper_runner = Arc::new(SweeperRunner::new(
        config.sweeper.clone(),
        Arc::clone(&sweeper),
    ));

    if config.sweeper.enabled {
        sweeper_runner.start().await;
    } else {
        info!("Background sweeper disabled in config");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        orchestrator,
        ledger,
        store,
        sweeper,
        Arc::clone(&sweeper_runner),
    ));

    // Create router
    let app = create_router(state);

    // Start server
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

    // Stop sweeper loop if running
    info!("Server shutting down...");
    if sweeper_runner.is_running() {
        sweeper_runner.stop().await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
