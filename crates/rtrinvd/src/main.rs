// # rtrinvd - Router Inventory Daemon
//
// Thin integration layer: no reconciliation logic lives here.
//
// The rtrinvd daemon is responsible for:
// 1. Reading configuration from environment variables and the inventory file
// 2. Initializing logging and the runtime
// 3. Building the store through the registry
// 4. Running the inventory engine until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Inventory
// - `RTRINV_CONFIG`: Path to the JSON inventory file (routers, store, engine)
//
// ### Store (overrides the file's `store` section)
// - `RTRINV_STORE_TYPE`: Type of store (file, memory)
// - `RTRINV_STORE_PATH`: Path to the store file (for file store)
//
// ### Logging
// - `RTRINV_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export RTRINV_CONFIG=/etc/rtrinv/inventory.json
// export RTRINV_STORE_TYPE=file
// export RTRINV_STORE_PATH=/var/lib/rtrinv/inventory.json
//
// rtrinvd
// ```

use anyhow::Result;
use rtrinv_core::poller::StaticTablePoller;
use rtrinv_core::{InventoryConfig, InventoryEngine, StoreConfig, StoreRegistry};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for router tasks to finish their cycle after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RtrinvExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RtrinvExitCode> for ExitCode {
    fn from(code: RtrinvExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration read from the environment
struct Config {
    config_path: String,
    store_type: Option<String>,
    store_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            config_path: env::var("RTRINV_CONFIG")
                .map_err(|_| anyhow::anyhow!("RTRINV_CONFIG is required. Set it via: export RTRINV_CONFIG=/etc/rtrinv/inventory.json"))?,
            store_type: env::var("RTRINV_STORE_TYPE").ok(),
            store_path: env::var("RTRINV_STORE_PATH").ok(),
            log_level: env::var("RTRINV_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the environment
    fn validate(&self) -> Result<()> {
        if !Path::new(&self.config_path).is_file() {
            anyhow::bail!("RTRINV_CONFIG does not point to a file: {}", self.config_path);
        }

        if let Some(store_type) = &self.store_type {
            match store_type.as_str() {
                "file" | "memory" => {}
                _ => anyhow::bail!(
                    "RTRINV_STORE_TYPE '{}' is not supported. \
                    Supported types: file, memory",
                    store_type
                ),
            }
        }

        if let Some(path) = &self.store_path {
            if path.is_empty() {
                anyhow::bail!("RTRINV_STORE_PATH cannot be empty");
            }

            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                anyhow::bail!(
                    "RTRINV_STORE_PATH parent directory does not exist: {}. \
                        Create it first: sudo mkdir -p {}",
                    parent.display(),
                    parent.display()
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "RTRINV_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Read the inventory file and apply the store overrides
    fn load_inventory(&self) -> Result<InventoryConfig> {
        let json = std::fs::read_to_string(&self.config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", self.config_path, e))?;
        let mut inventory = InventoryConfig::from_json(&json)?;

        let store_path = self.store_path.clone().or(match &inventory.store {
            StoreConfig::File { path } => Some(path.clone()),
            _ => None,
        });

        match self.store_type.as_deref() {
            Some("memory") => inventory.store = StoreConfig::Memory,
            Some("file") => {
                let path = store_path.ok_or_else(|| {
                    anyhow::anyhow!(
                        "RTRINV_STORE_PATH is required when RTRINV_STORE_TYPE=file. \
                        Set it via: export RTRINV_STORE_PATH=/var/lib/rtrinv/inventory.json"
                    )
                })?;
                inventory.store = StoreConfig::File { path };
            }
            _ => {
                if let (Some(path), StoreConfig::File { .. }) = (&self.store_path, &inventory.store) {
                    inventory.store = StoreConfig::File { path: path.clone() };
                }
            }
        }

        inventory.validate()?;
        Ok(inventory)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return RtrinvExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return RtrinvExitCode::ConfigError.into();
    }

    let inventory = match config.load_inventory() {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Inventory configuration error: {}", e);
            return RtrinvExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RtrinvExitCode::ConfigError.into();
    }

    info!("Starting rtrinvd daemon");
    info!("Configuration loaded: {} router(s)", inventory.routers.len());

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RtrinvExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(inventory).await {
            error!("Daemon error: {:#}", e);
            RtrinvExitCode::RuntimeError
        } else {
            RtrinvExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(inventory: InventoryConfig) -> Result<()> {
    let registry = StoreRegistry::with_builtin_stores();
    info!("Store type: {}", inventory.store.type_name());
    let store = Arc::from(registry.create_store(&inventory.store).await?);

    // Until a device transport is wired in, routers are served the interface
    // tables listed in the inventory file
    let poller = Arc::new(StaticTablePoller::from_routers(&inventory.build_routers()));

    let (engine, mut events) = InventoryEngine::new(store, poller, inventory)?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "engine event");
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_run = engine.run_with_shutdown(Some(shutdown_rx));
    tokio::pin!(engine_run);

    info!("Daemon initialized successfully");

    tokio::select! {
        // Engine stopped on its own: bootstrap failed
        result = &mut engine_run => return result.map_err(Into::into),

        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
            info!("Shutting down daemon");
        }
    }

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, engine_run).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT)),
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

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
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
