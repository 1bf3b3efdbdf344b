// # wrcd - connector daemon
//
// Thin integration layer over wrc-core:
// 1. Reading daemon configuration from environment variables
// 2. Loading the connector settings file and routing the pipelines
// 3. Serving the inbound routes (receive mode) or feeding host events from
//    stdin into the SyncEngine (send mode)
//
// All sync logic lives in wrc-core.
//
// ## Configuration
//
// - `WRC_SETTINGS_PATH`: JSON settings file (required)
// - `WRC_BIND_ADDR`: Listen address in receive mode (default `0.0.0.0:8080`)
// - `WRC_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `WRC_PRODUCT_CATALOG`: `true` when the host has a product catalog
// - `WRC_SNAPSHOT_TTL_SECS`: Snapshot lifetime (default 3600)
//
// ## Example
//
// ```bash
// export WRC_SETTINGS_PATH=/etc/wrc/settings.json
// export WRC_PRODUCT_CATALOG=true
//
// host-event-feed | wrcd
// ```

mod sender;

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;
use wrc_core::engine::{SyncEngine, SyncEvent};
use wrc_core::events::{EventHub, ReceiveEvent};
use wrc_core::router::{HostEnvironment, ModeRouter, Routing};
use wrc_core::settings::FileSettingsStore;
use wrc_core::state::MemorySnapshotStore;
use wrc_core::traits::{SNAPSHOT_TTL_SECS, SettingsStore};
use wrc_core::SyncConfig;
use wrc_receiver::{LoggingSubscriber, ReceiverState};
use wrc_transport_http::HttpTransport;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WrcExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WrcExitCode> for ExitCode {
    fn from(code: WrcExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
#[derive(Debug)]
struct Config {
    settings_path: String,
    bind_addr: String,
    log_level: String,
    product_catalog: bool,
    snapshot_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            settings_path: env::var("WRC_SETTINGS_PATH")
                .context("WRC_SETTINGS_PATH is required")?,
            bind_addr: env::var("WRC_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            log_level: env::var("WRC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            product_catalog: env::var("WRC_PRODUCT_CATALOG")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            snapshot_ttl_secs: match env::var("WRC_SNAPSHOT_TTL_SECS") {
                Ok(v) => v.trim().parse().with_context(|| {
                    format!("WRC_SNAPSHOT_TTL_SECS must be a number of seconds. Got: {}", v)
                })?,
                Err(_) => SNAPSHOT_TTL_SECS,
            },
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.settings_path.trim().is_empty() {
            anyhow::bail!(
                "WRC_SETTINGS_PATH cannot be empty. \
                Set it via: export WRC_SETTINGS_PATH=/etc/wrc/settings.json"
            );
        }

        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "WRC_BIND_ADDR must be an address like 0.0.0.0:8080. Got: {}",
                self.bind_addr
            );
        }

        if !(1..=86_400).contains(&self.snapshot_ttl_secs) {
            anyhow::bail!(
                "WRC_SNAPSHOT_TTL_SECS must be between 1 and 86400 seconds. Got: {}",
                self.snapshot_ttl_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "WRC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn host(&self) -> HostEnvironment {
        HostEnvironment {
            product_catalog_active: self.product_catalog,
        }
    }
}

/// Connector settings resolved at startup
struct Prepared {
    sync_config: SyncConfig,
    routing: Routing,
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WrcExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WrcExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WrcExitCode::ConfigError.into();
    }

    info!("Starting wrcd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WrcExitCode::RuntimeError.into();
        }
    };

    let prepared = match rt.block_on(prepare(&config)) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return WrcExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, prepared).await {
            error!("Daemon error: {:#}", e);
            WrcExitCode::RuntimeError
        } else {
            WrcExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Load settings and decide pipeline roles
async fn prepare(config: &Config) -> Result<Prepared> {
    let store = FileSettingsStore::open(&config.settings_path)
        .await
        .with_context(|| format!("Failed to open settings file {}", config.settings_path))?;

    let sync_config = store
        .load_config()
        .await
        .context("Failed to load connector settings")?;

    info!("Configured mode: {}", sync_config.mode);

    let routing = ModeRouter::route(&sync_config, &config.host());
    if !routing.any_sender() && !routing.any_receiver() {
        anyhow::bail!("No pipeline is active; check the credentials for the configured mode");
    }

    Ok(Prepared {
        sync_config,
        routing,
    })
}

/// Run the daemon
async fn run_daemon(config: Config, prepared: Prepared) -> Result<()> {
    let Prepared {
        sync_config,
        routing,
    } = prepared;

    if routing.any_receiver() {
        run_receiver(&config, &sync_config, routing).await
    } else {
        run_sender(&config, &sync_config, routing).await
    }
}

async fn run_receiver(config: &Config, sync_config: &SyncConfig, routing: Routing) -> Result<()> {
    let credentials = sync_config.inbound_credentials()?;

    let hub = Arc::new(EventHub::new());
    hub.subscribe(ReceiveEvent::PostData, Arc::new(LoggingSubscriber));
    hub.subscribe(ReceiveEvent::ProductData, Arc::new(LoggingSubscriber));

    let state = Arc::new(ReceiverState::new(credentials, hub, routing));
    let app = wrc_receiver::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!("Receiver listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match wait_for_shutdown().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Shutdown handler error: {}", e),
            }
        })
        .await
        .context("Receiver server error")?;

    info!("Receiver stopped");
    Ok(())
}

async fn run_sender(config: &Config, sync_config: &SyncConfig, routing: Routing) -> Result<()> {
    let transport = HttpTransport::from_config(sync_config)?;
    let snapshots =
        MemorySnapshotStore::with_ttl(chrono::Duration::seconds(config.snapshot_ttl_secs));

    let (engine, events) = SyncEngine::new(
        sync_config,
        routing,
        Box::new(snapshots),
        Box::new(transport),
    );
    let event_logger = tokio::spawn(log_events(events));

    info!("Sender reading host events from stdin");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stats = sender::run_sender(&engine, stdin, async {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {}", e),
        }
    })
    .await
    .context("Failed to read host events")?;

    // Dropping the engine closes the event channel
    drop(engine);
    let _ = event_logger.await;

    info!(
        "Sender stopped: {} event(s), {} sent, {} failed, {} malformed",
        stats.processed, stats.sent, stats.failed, stats.malformed
    );
    Ok(())
}

async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
