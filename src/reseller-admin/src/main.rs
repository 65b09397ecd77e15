//! Reseller Admin: multi-tenant backend for reselling shared subscription
//! accounts.
//!
//! Main entry point that loads configuration, restores the store and starts
//! the background tasks and the HTTP server.

use anyhow::Context;
use clap::Parser;
use reseller_api::ApiServer;
use reseller_core::config::AppConfig;
use reseller_management::{spawn_flush_task, spawn_reminder_task, ManagementState, ResellerStore, StoreSettings};
use reseller_notifications::NotificationService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "reseller-admin")]
#[command(about = "Backend for managing resold subscription accounts and their customers")]
#[command(version)]
struct Cli {
    /// TOML configuration file, applied before environment variables
    #[arg(long, short, env = "RESELLER_ADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long, env = "RESELLER_ADMIN__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "RESELLER_ADMIN__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Snapshot file for persistence (overrides config)
    #[arg(long, env = "RESELLER_ADMIN__STORAGE__SNAPSHOT_PATH")]
    snapshot: Option<PathBuf>,

    /// Disable the periodic reminder sweep
    #[arg(long, default_value_t = false)]
    no_reminders: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reseller_admin=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Reseller Admin starting up");

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // CLI overrides
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(path) = cli.snapshot {
        config.storage.snapshot_path = Some(path.display().to_string());
    }
    if cli.no_reminders {
        config.reminders.enabled = false;
    }

    info!(
        node_id = %config.node_id,
        host = %config.api.host,
        http_port = config.api.http_port,
        push = config.push.is_usable(),
        snapshot = ?config.storage.snapshot_path,
        "Configuration loaded"
    );

    let store = Arc::new(ResellerStore::new(StoreSettings::from_config(&config)));
    let snapshot_path = config.storage.snapshot_path.as_ref().map(PathBuf::from);
    if let Some(path) = &snapshot_path {
        let loaded = store
            .load_snapshot(path)
            .with_context(|| format!("restoring snapshot {}", path.display()))?;
        if loaded {
            info!(path = %path.display(), "Snapshot restored");
        } else {
            info!(path = %path.display(), "No snapshot yet, starting empty");
        }
        spawn_flush_task(
            store.clone(),
            path.clone(),
            Duration::from_secs(config.storage.flush_interval_secs.max(1)),
        );
    }

    let notifications = NotificationService::from_config(&config);
    info!(notifier = notifications.notifier_name(), "Notifications configured");

    if config.reminders.enabled {
        spawn_reminder_task(
            store.clone(),
            notifications.clone(),
            Duration::from_secs(config.reminders.interval_secs.max(1)),
        );
        info!(interval_secs = config.reminders.interval_secs, "Reminder sweep scheduled");
    }

    let api_server = ApiServer::new(
        config.clone(),
        ManagementState {
            store: store.clone(),
            notifications,
        },
    );

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Reseller Admin is ready to serve traffic");

    tokio::select! {
        result = api_server.start_http() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    if let Some(path) = &snapshot_path {
        match store.save_snapshot(path) {
            Ok(()) => info!(path = %path.display(), "Final snapshot written"),
            Err(e) => error!(error = %e, "Final snapshot failed"),
        }
    }

    Ok(())
}
