//! Core inventory engine
//!
//! The InventoryEngine is responsible for:
//! - Bootstrapping the store from the configured routers
//! - Polling each router's interface table on its own interval
//! - Reconciling the polled table against storage and applying the diff
//! - Flushing the store on shutdown
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────┐
//!                    │ InventoryEngine  │
//!                    └──────────────────┘
//!                             │ one RouterTask per router
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │InterfacePoller│   │  reconcile()  │   │ActionExecutor │
//! │   (poll)      │──▶│   (diff)      │──▶│   (apply)     │──▶ Events
//! └───────────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Poll the router's interface table
//! 2. Stamp polled interfaces with the router identity and carry counters
//! 3. Read the stored interfaces and compute the diff
//! 4. Apply the diff, replace the in-memory table
//! 5. Refresh the router row from storage, emit an event

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::InventoryConfig;
use crate::error::{Error, Result};
use crate::executor::ActionExecutor;
use crate::load::load_interfaces;
use crate::model::{EntityKind, Router};
use crate::reconcile::{DiffSummary, reconcile, same_identity};
use crate::sync::{BootstrapReport, RouterSynchronizer};
use crate::traits::{InterfacePoller, InventoryStore};

/// How a router was brought in line with storage at bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    Pulled,
    Pushed,
    Unchanged,
}

/// Events emitted by the InventoryEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { routers_count: usize },

    /// Router synchronized with storage during bootstrap
    RouterBootstrapped {
        unique_name: String,
        outcome: BootstrapOutcome,
    },

    /// One reconciliation cycle completed
    InterfacesReconciled {
        unique_name: String,
        summary: DiffSummary,
    },

    /// A diff action could not be applied
    ActionFailed { unique_name: String, error: String },

    /// The poller returned an error; nothing was written
    PollFailed { unique_name: String, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Handle on a running per-router task
///
/// Cancellation is only observed between cycles, so a cancelled task always
/// finishes the diff it is applying before [`RouterTask::join`] returns.
pub struct RouterTask {
    unique_name: String,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<Router>,
}

impl RouterTask {
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Ask the task to stop after the current cycle
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task and take back the router it owned
    pub async fn join(self) -> Result<Router> {
        self.handle
            .await
            .map_err(|e| Error::Other(format!("router task {} failed: {}", self.unique_name, e)))
    }
}

/// Everything one reconciliation cycle needs, shared by all router tasks
#[derive(Clone)]
struct CycleRunner {
    store: Arc<dyn InventoryStore>,
    poller: Arc<dyn InterfacePoller>,
    synchronizer: RouterSynchronizer,
    executor: ActionExecutor,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl CycleRunner {
    async fn reconcile_router(&self, router: &mut Router) -> Result<DiffSummary> {
        let router_id = router.id.ok_or_else(|| {
            Error::missing_identity(format!("router {} was never persisted", router.unique_name))
        })?;

        let mut polled = match self.poller.poll(router).await {
            Ok(polled) => polled,
            Err(e) => {
                warn!(
                    "Poller {} failed for router {}: {}",
                    self.poller.poller_name(),
                    router.unique_name,
                    e
                );
                self.emit_event(EngineEvent::PollFailed {
                    unique_name: router.unique_name.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        for interface in polled.iter_mut() {
            interface.router_id = Some(router_id);
            if let Some(previous) = router.interfaces.iter().find(|i| same_identity(i, interface)) {
                interface.counters = previous.counters.advanced(&interface.counters);
            }
        }

        let stored = load_interfaces(self.store.as_ref(), router).await?;
        let diff = reconcile(&polled, &stored);

        let report = match self.executor.apply(router_id, &polled, &stored, &diff).await {
            Ok(report) => report,
            Err(e) => {
                self.emit_event(EngineEvent::ActionFailed {
                    unique_name: router.unique_name.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        for failure in &report.failures {
            self.emit_event(EngineEvent::ActionFailed {
                unique_name: router.unique_name.clone(),
                error: failure.to_string(),
            });
        }

        router.interfaces = report.interfaces;
        self.synchronizer.refresh(router).await?;

        if report.applied.writes() > 0 {
            info!("Reconciled router {}: {}", router.unique_name, report.applied);
        } else {
            debug!("Router {} is up to date", router.unique_name);
        }
        self.emit_event(EngineEvent::InterfacesReconciled {
            unique_name: router.unique_name.clone(),
            summary: report.applied,
        });

        Ok(report.applied)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Bounded channel: drop rather than block a router task
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Core inventory engine
///
/// ## Lifecycle
///
/// 1. Create with [`InventoryEngine::new()`]
/// 2. Start with [`InventoryEngine::run()`]
/// 3. Engine runs until shutdown signal received
/// 4. Router tasks are cancelled and joined, then the store is flushed
///
/// ## Threading
///
/// Each router is owned by exactly one task while the engine runs. Nothing
/// mutable is shared between routers; the store and poller are shared
/// behind `Arc`.
pub struct InventoryEngine {
    runner: CycleRunner,

    /// Routers not currently owned by a task
    routers: Mutex<Vec<Router>>,

    /// Interval for routers whose own interval is 0
    default_interval: Duration,
}

impl InventoryEngine {
    /// Create a new inventory engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        store: Arc<dyn InventoryStore>,
        poller: Arc<dyn InterfacePoller>,
        config: InventoryConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let runner = CycleRunner {
            synchronizer: RouterSynchronizer::new(store.clone(), config.engine.router_metadata_policy),
            executor: ActionExecutor::new(store.clone(), config.engine.failure_policy),
            store,
            poller,
            event_tx: tx,
        };

        let engine = Self {
            runner,
            routers: Mutex::new(config.build_routers()),
            default_interval: Duration::from_secs(config.engine.default_polling_interval_secs),
        };

        Ok((engine, rx))
    }

    /// The store the engine writes to
    pub fn store(&self) -> Arc<dyn InventoryStore> {
        self.runner.store.clone()
    }

    /// Snapshot of the routers not currently owned by a running task
    pub async fn routers(&self) -> Vec<Router> {
        self.routers.lock().await.clone()
    }

    /// Ensure every table and bring the store in line with the configured routers
    ///
    /// Afterward every router carries its storage identity, its SNMP config
    /// and its stored interface table.
    pub async fn bootstrap(&self) -> Result<BootstrapReport> {
        for kind in EntityKind::ALL {
            self.runner.store.ensure_schema(kind).await?;
        }

        let mut routers = self.routers.lock().await;
        let report = self.runner.synchronizer.bootstrap_or_create(&mut routers).await?;

        for router in routers.iter_mut() {
            self.runner.synchronizer.sync_snmp_config(router).await?;
            router.interfaces = load_interfaces(self.runner.store.as_ref(), router).await?;
        }

        let outcomes = [
            (&report.created, BootstrapOutcome::Created),
            (&report.pulled, BootstrapOutcome::Pulled),
            (&report.pushed, BootstrapOutcome::Pushed),
            (&report.unchanged, BootstrapOutcome::Unchanged),
        ];
        for (names, outcome) in outcomes {
            for unique_name in names {
                self.emit_event(EngineEvent::RouterBootstrapped {
                    unique_name: unique_name.clone(),
                    outcome,
                });
            }
        }

        info!(
            "Bootstrapped {} router(s): {} created, {} pulled, {} pushed",
            report.total(),
            report.created.len(),
            report.pulled.len(),
            report.pushed.len()
        );
        Ok(report)
    }

    /// Run one reconciliation cycle for `router`
    pub async fn reconcile_router(&self, router: &mut Router) -> Result<DiffSummary> {
        self.runner.reconcile_router(router).await
    }

    /// Run one reconciliation cycle for every router the engine holds
    ///
    /// Stops at the first failing router.
    pub async fn reconcile_all(&self) -> Result<Vec<DiffSummary>> {
        let mut routers = self.routers.lock().await;
        let mut summaries = Vec::with_capacity(routers.len());
        for router in routers.iter_mut() {
            summaries.push(self.runner.reconcile_router(router).await?);
        }
        Ok(summaries)
    }

    /// Spawn the polling task for `router`
    pub fn spawn_router_task(&self, router: Router) -> RouterTask {
        let period = match router.polling_interval_secs {
            0 => self.default_interval,
            secs => Duration::from_secs(secs),
        };
        let unique_name = router.unique_name.clone();
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let runner = self.runner.clone();

        let handle = tokio::spawn(async move {
            let mut router = router;
            let mut ticks = IntervalStream::new(tokio::time::interval(period));
            debug!("Polling router {} every {:?}", router.unique_name, period);

            loop {
                tokio::select! {
                    biased;

                    _ = cancel_rx.changed() => break,

                    Some(_) = ticks.next() => {
                        if let Err(e) = runner.reconcile_router(&mut router).await {
                            if e.is_fatal() {
                                error!("Stopping router {}: {}", router.unique_name, e);
                                break;
                            }
                            error!("Cycle failed for router {}: {}", router.unique_name, e);
                        }
                    }
                }

                if *cancel_rx.borrow() {
                    break;
                }
            }

            router
        });

        RouterTask {
            unique_name,
            cancel_tx,
            handle,
        }
    }

    /// Run the engine
    ///
    /// Bootstraps, starts one task per router and waits for SIGINT.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let routers_count = self.routers.lock().await.len();
        self.emit_event(EngineEvent::Started { routers_count });

        self.bootstrap().await?;

        let routers = std::mem::take(&mut *self.routers.lock().await);
        let tasks: Vec<RouterTask> = routers
            .into_iter()
            .map(|router| self.spawn_router_task(router))
            .collect();
        info!("Started {} router task(s)", tasks.len());

        match shutdown_rx {
            // Test mode: wait for provided shutdown signal
            Some(rx) => {
                let _ = rx.await;
            }
            // Production mode: wait for SIGINT
            None => tokio::signal::ctrl_c().await?,
        }
        info!("Shutdown signal received");

        for task in &tasks {
            task.cancel();
        }

        let mut routers = self.routers.lock().await;
        for task in tasks {
            let unique_name = task.unique_name().to_string();
            match task.join().await {
                Ok(router) => routers.push(router),
                Err(e) => error!("Lost router {}: {}", unique_name, e),
            }
        }
        drop(routers);

        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        // Flush state before exiting
        self.runner.store.flush().await?;
        info!("Store flushed, engine stopped");

        Ok(())
    }

    fn emit_event(&self, event: EngineEvent) {
        self.runner.emit_event(event);
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// Production code should use `run()`, which waits for OS signals.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
