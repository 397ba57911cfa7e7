use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enasub_core::{
    load_config, validate_config, AssemblyMachine, EscalationMonitor, HttpRegistrar, LogNotifier,
    ManifestBuilder, Notifier, ReconcileScheduler, SanitizedConfig, SlackNotifier,
    SqliteSubmissionStore, SubmissionMachine, SubmissionStore,
};

use enasub_server::api::create_router;
use enasub_server::state::AppState;

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

    // Determine config path
    let config_path = std::env::var("ENASUB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    // Create SQLite record store
    let store: Arc<dyn SubmissionStore> = Arc::new(
        SqliteSubmissionStore::new(&config.database.path)
            .context("Failed to open record store")?,
    );
    info!("Record store initialized at {:?}", config.database.path);

    // Create registrar client
    let registrar = Arc::new(
        HttpRegistrar::new(config.registrar.clone())
            .context("Failed to create registrar client")?,
    );
    info!("Registrar client targets {}", config.registrar.submission_url);

    // Create notifier
    let notifier: Arc<dyn Notifier> = match &config.notifications.slack {
        Some(slack_config) => {
            info!("Alerts are sent to Slack");
            Arc::new(
                SlackNotifier::new(slack_config.clone())
                    .context("Failed to create Slack notifier")?,
            )
        }
        None => {
            info!("No Slack hook configured, alerts go to the log only");
            Arc::new(LogNotifier::new())
        }
    };

    let builder = ManifestBuilder::new(config.manifest.clone(), config.organisms.clone());

    let scheduler = Arc::new(ReconcileScheduler::new(
        SubmissionMachine::new(Arc::clone(&store)),
        AssemblyMachine::new(
            Arc::clone(&store),
            registrar,
            builder,
            config.reconciler.retry_policy(),
            config.reconciler.check_interval(),
        ),
        EscalationMonitor::new(Arc::clone(&store), notifier, config.escalation.clone()),
        config.reconciler.cycle_interval(),
    ));

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&scheduler),
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // A fatal scheduler error also fires the shutdown broadcast.
    let (shutdown_tx, scheduler_rx) = broadcast::channel(1);
    let mut server_rx = shutdown_tx.subscribe();

    let scheduler_handle = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            let result = scheduler.run(scheduler_rx).await;
            if result.is_err() {
                let _ = shutdown_tx.send(());
            }
            result
        })
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {},
                _ = server_rx.recv() => {},
            }
        })
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let _ = shutdown_tx.send(());

    scheduler_handle
        .await
        .context("Reconcile scheduler task failed")?
        .context("Reconcile scheduler stopped on a fatal error")?;
    info!("Reconcile scheduler stopped");

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
