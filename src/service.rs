//! Subsystem façade wiring the status store, binder, scheduler, executor,
//! restore orchestrator, and failure monitor together.
//!
//! The host application drives the lifecycle: `start` on wallet unlock,
//! `stop` on lock/background, `restore_all` once after wallet recovery (before
//! `start`), `schedule_all` once after wallet creation.

use crate::binder::ChangeBinder;
use crate::clock::{Clock, SystemClock};
use crate::config::BackupConfig;
use crate::executor::BackupExecutor;
use crate::flags::SuppressionFlags;
use crate::monitor::FailureMonitor;
use crate::restore::RestoreOrchestrator;
use crate::scheduler::BackupScheduler;
use crate::sources::{AlertSink, ExternalSyncSource, RemoteBackupStore, SourceMap};
use crate::status::{StatusMap, StatusStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct BackupService {
    store: Arc<StatusStore>,
    flags: Arc<SuppressionFlags>,
    binder: ChangeBinder,
    scheduler: Arc<BackupScheduler>,
    monitor: Arc<FailureMonitor>,
    restore: RestoreOrchestrator,
    cancel: Mutex<CancellationToken>,
    started: AtomicBool,
}

impl BackupService {
    pub async fn new(
        config: BackupConfig,
        remote: Arc<dyn RemoteBackupStore>,
        sources: SourceMap,
        external: Option<Arc<dyn ExternalSyncSource>>,
        alerts: Arc<dyn AlertSink>,
    ) -> anyhow::Result<Self> {
        Self::with_clock(config, remote, sources, external, alerts, Arc::new(SystemClock)).await
    }

    /// Construct with an explicit clock (deterministic tests).
    pub async fn with_clock(
        config: BackupConfig,
        remote: Arc<dyn RemoteBackupStore>,
        sources: SourceMap,
        external: Option<Arc<dyn ExternalSyncSource>>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(StatusStore::open(&config.status_file).await?);
        let flags = SuppressionFlags::new();
        let sources = Arc::new(sources);

        let executor = Arc::new(BackupExecutor::new(
            store.clone(),
            remote.clone(),
            sources.clone(),
            clock.clone(),
        ));
        let scheduler = Arc::new(BackupScheduler::new(
            store.clone(),
            executor,
            flags.clone(),
            clock.clone(),
            config.debounce(),
            config.monitor_interval(),
        ));
        let binder = ChangeBinder::new(
            store.clone(),
            sources.clone(),
            external,
            flags.clone(),
            clock.clone(),
        );
        let monitor = Arc::new(FailureMonitor::new(
            store.clone(),
            alerts,
            clock,
            config.monitor_interval(),
            config.stale_threshold_ms(),
            config.alert_cooldown_ms(),
        ));
        let restore = RestoreOrchestrator::new(store.clone(), remote, sources, flags.clone());

        Ok(Self {
            store,
            flags,
            binder,
            scheduler,
            monitor,
            restore,
            cancel: Mutex::new(CancellationToken::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Start the subsystem: stale-flag reconcile, change subscriptions,
    /// scheduling, and the failure monitor. Idempotent; a second call while
    /// running is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Backup subsystem already started");
            return;
        }
        let cancel = CancellationToken::new();
        *self.cancel.lock().unwrap() = cancel.clone();

        self.binder.spawn_all(&cancel);
        self.scheduler.spawn(&cancel);
        self.monitor.spawn(&cancel);
        info!("Backup subsystem started");
    }

    /// Cancel all subscriptions, pending/in-flight jobs, and the monitor.
    /// Safe to call when never started.
    pub fn stop(&self) {
        self.cancel.lock().unwrap().cancel();
        if self.started.swap(false, Ordering::SeqCst) {
            info!("Backup subsystem stopped");
        }
    }

    /// Full restore from the remote store. Intended to run once, before
    /// `start`, early in the wallet-unlock lifecycle.
    pub async fn restore_all(&self) -> anyhow::Result<()> {
        self.restore.restore_all().await
    }

    /// Mark every backup-capable category required (bulk/initial backup).
    pub async fn schedule_all(&self) -> anyhow::Result<()> {
        self.scheduler.schedule_all().await
    }

    /// Raise or clear the wallet-wipe suppression flag. While set, change
    /// events are dropped and nothing is scheduled.
    pub fn set_wiping(&self, wiping: bool) {
        self.flags.set_wiping(wiping);
    }

    /// Reset all statuses to defaults (part of the wallet-wipe flow).
    pub async fn reset_statuses(&self) -> anyhow::Result<()> {
        self.store.reset().await
    }

    /// Observe the status map, e.g. for a backup-settings screen.
    pub fn observe_status(&self) -> watch::Receiver<StatusMap> {
        self.store.observe()
    }

    pub async fn status_snapshot(&self) -> StatusMap {
        self.store.snapshot().await
    }
}

impl Drop for BackupService {
    fn drop(&mut self) {
        self.cancel.lock().unwrap().cancel();
    }
}
