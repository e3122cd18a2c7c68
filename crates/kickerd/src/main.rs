//! kickerd - The session-kicker background service
//!
//! This is the main entry point for the kickerd service.
//! It wires together all the components:
//! - Configuration loading (file plus CLI/env overrides)
//! - Store initialization
//! - Jellyfin adapter
//! - The poll loop
//! - Signal handling and auditing of quota events

use anyhow::{Context, Result};
use clap::Parser;
use kicker_config::{ConfigOverrides, load_config_with_overrides};
use kicker_core::{Kicker, KickerEvent};
use kicker_host_api::MediaServer;
use kicker_host_jellyfin::{JellyfinClient, JellyfinConfig};
use kicker_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use kicker_util::{DATABASE_FILENAME, default_config_path};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// kickerd - Daily watch-time quotas for media server sessions
#[derive(Parser, Debug)]
#[command(name = "kickerd")]
#[command(about = "Daily watch-time quotas for media server sessions", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/session-kicker/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Media server URL override (or set KICKER_SERVER_URL env var)
    #[arg(long, env = "KICKER_SERVER_URL")]
    server_url: Option<String>,

    /// Media server API key (or set KICKER_API_KEY env var)
    #[arg(long, env = "KICKER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Data directory override (or set KICKER_DATA_DIR env var)
    #[arg(short, long, env = "KICKER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    kicker: Kicker,
    store: Arc<dyn Store>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let overrides = ConfigOverrides {
            server_url: args.server_url.clone(),
            api_key: args.api_key.clone(),
            data_dir: args.data_dir.clone(),
        };
        let config = load_config_with_overrides(&args.config, &overrides)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            server = %config.server.url,
            "Configuration loaded"
        );

        let data_dir = config.service.data_dir.clone();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(DATABASE_FILENAME);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;
        store.append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
            identity_mode: config.quota.identity_mode,
            max_watch_secs: config.quota.max_watch_time.as_secs(),
            reset_time: config.quota.reset_time.map(|at| at.to_string()),
        }))?;

        let server: Arc<dyn MediaServer> = Arc::new(
            JellyfinClient::new(JellyfinConfig {
                base_url: config.server.url.clone(),
                api_key: config.server.api_key.clone(),
                timeout: config.server.request_timeout,
            })
            .context("Failed to create media server client")?,
        );

        if kicker_util::is_mock_time_active() {
            warn!("Mock time is active; reset scheduling follows the mocked clock");
        }

        let kicker = Kicker::new(&config, server, store.clone(), kicker_util::now());

        Ok(Self { kicker, store })
    }

    async fn run(mut self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        spawn_signal_listener(shutdown_tx)?;

        info!("Service running");

        let store = self.store.clone();
        self.kicker
            .run(shutdown_rx, |events| {
                for event in events {
                    audit_event(store.as_ref(), event);
                }
            })
            .await;

        info!("Shutting down kickerd");

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Flip the shutdown channel on SIGTERM, SIGINT or SIGHUP
fn spawn_signal_listener(shutdown: watch::Sender<bool>) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
        }
        let _ = shutdown.send(true);
    });

    Ok(())
}

/// Record quota transitions in the audit log. Per-cycle accrual is not audited.
fn audit_event(store: &dyn Store, event: &KickerEvent) {
    let audit = match event {
        KickerEvent::EntityRestricted {
            entity_id,
            session_id,
            media_type,
        } => AuditEventType::EntityRestricted {
            entity_id: entity_id.clone(),
            session_id: session_id.clone(),
            media_type: media_type.clone(),
        },
        KickerEvent::QuotaExceeded {
            entity_id,
            session_id,
            watched,
        } => AuditEventType::EnforcementIssued {
            entity_id: entity_id.clone(),
            session_id: session_id.clone(),
            watched_secs: watched.as_secs(),
        },
        KickerEvent::QuotaReset {
            entities_cleared, ..
        } => AuditEventType::QuotaReset {
            entities_cleared: *entities_cleared,
        },
        KickerEvent::WatchTimeAccrued { .. } => return,
    };

    if let Err(e) = store.append_audit(AuditEvent::new(audit)) {
        warn!(error = %e, "Failed to write audit event");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "kickerd starting");

    let service = Service::new(&args)?;
    service.run().await
}
