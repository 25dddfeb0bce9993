//! bridge-crm - Contact engagement and CRM sync service
//!
//! Scores website engagement events into per-contact lead scores and keeps
//! the ClickUp contact list in step with locally-known contacts.
//!
//! Default port: 5780

use anyhow::{Context, Result};
use bridge_common::config::{load_toml, resolve_config_path};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridge_crm::config::{
    resolve_clickup_config, resolve_database_path, CrmBackend, TomlConfig, DEFAULT_PORT,
};
use bridge_crm::services::{
    ClickUpClient, ClickUpContactStore, ContactStore, FixedWindowRateLimiter,
    InMemoryContactStore,
};
use bridge_crm::{AppState, CrmStatus};

/// Command-line arguments for bridge-crm
#[derive(Parser, Debug)]
#[command(name = "bridge-crm")]
#[command(about = "Contact engagement scoring and ClickUp CRM sync")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "BRIDGE_CRM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "BRIDGE_CRM_PORT")]
    port: Option<u16>,

    /// Sync ledger database file
    #[arg(short, long, env = "BRIDGE_CRM_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging starts so the TOML log level applies
    let config_path = resolve_config_path(args.config.as_deref(), "BRIDGE_CONFIG", "bridge-crm.toml");
    let loaded = config_path.as_deref().map(load_toml::<TomlConfig>);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("bridge_crm={},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        revision = env!("BRIDGE_REVISION"),
        built_at = env!("BRIDGE_BUILT_AT"),
        profile = env!("BRIDGE_PROFILE"),
        "Starting bridge-crm"
    );

    match (&config_path, &loaded) {
        (Some(path), Some(Ok(_))) => info!("Config: {}", path.display()),
        (_, Some(Err(e))) => warn!("{} - using defaults", e),
        _ => info!("No config file found, using defaults"),
    }

    let db_path = resolve_database_path(args.database.clone().or(config.database_path.clone()));
    info!("Sync ledger: {}", db_path.display());
    let db_pool = bridge_crm::db::init_database_pool(&db_path)
        .await
        .context("Failed to open sync ledger database")?;

    let crm = build_crm(&config);
    if let CrmStatus::Unconfigured(reason) = &crm {
        error!("{}", reason);
        warn!("CRM operations are disabled until ClickUp is configured");
    }

    let rate_limit = config.rate_limit.resolve();
    info!(
        "Sync rate limit: {} requests per {}s per client",
        rate_limit.max_requests,
        rate_limit.window.as_secs()
    );

    let mut state = AppState::new(
        crm,
        db_pool,
        Arc::new(FixedWindowRateLimiter::new(rate_limit)),
    );
    if let Some(marker) = config.admin.token_marker.clone().filter(|m| !m.trim().is_empty()) {
        state = state.with_admin_token_marker(marker);
    }

    let app = bridge_crm::build_router(state);

    let host = args
        .host
        .or(config.server.host.clone())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.port.or(config.server.port).unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Pick the contact store from configuration
fn build_crm(config: &TomlConfig) -> CrmStatus {
    if config.clickup.mode == CrmBackend::Memory {
        warn!("Using in-memory contact store; contacts are lost on restart");
        let store: Arc<dyn ContactStore> = Arc::new(InMemoryContactStore::new());
        return CrmStatus::Ready(store);
    }

    let clickup = match resolve_clickup_config(&config.clickup) {
        Ok(clickup) => clickup,
        Err(e) => return CrmStatus::Unconfigured(e.to_string()),
    };

    match ClickUpClient::new(&clickup) {
        Ok(client) => {
            info!(
                list_id = %clickup.list_id,
                space_id = clickup.space_id.as_deref().unwrap_or("-"),
                team_id = clickup.team_id.as_deref().unwrap_or("-"),
                "ClickUp CRM configured"
            );
            let store: Arc<dyn ContactStore> = Arc::new(ClickUpContactStore::new(client));
            CrmStatus::Ready(store)
        }
        Err(e) => CrmStatus::Unconfigured(format!("Failed to create ClickUp client: {}", e)),
    }
}

/// Graceful shutdown signal handler
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
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
