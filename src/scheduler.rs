//! Per-category debounced backup scheduling.
//!
//! The scheduler watches the status store. When a category's `required_at`
//! advances past the last value it acted on (and the category is pending, not
//! running, and not suppressed), it installs a debounce task in that
//! category's job slot. Re-triggering within the window replaces the slot,
//! restarting the debounce; the window elapsing re-checks the predicate and
//! hands the category to the executor. At most one job is ever in flight per
//! category, and a periodic sweep re-schedules categories left pending by a
//! failed run.

use crate::category::{BackupCategory, BACKUP_CATEGORIES};
use crate::clock::Clock;
use crate::executor::BackupExecutor;
use crate::flags::SuppressionFlags;
use crate::jobs::{JobSlots, SlotHandle};
use crate::status::{BackupStatus, StatusMap, StatusStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct BackupScheduler {
    store: Arc<StatusStore>,
    executor: Arc<BackupExecutor>,
    slots: JobSlots,
    flags: Arc<SuppressionFlags>,
    clock: Arc<dyn Clock>,
    debounce: Duration,
    retry_interval: Duration,
}

impl BackupScheduler {
    pub fn new(
        store: Arc<StatusStore>,
        executor: Arc<BackupExecutor>,
        flags: Arc<SuppressionFlags>,
        clock: Arc<dyn Clock>,
        debounce: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            slots: JobSlots::new(),
            flags,
            clock,
            debounce,
            retry_interval,
        }
    }

    /// Run the scheduling loop until cancelled. Reconciles stale `running`
    /// flags first, then retries categories left pending by a previous
    /// session, then reacts to status emissions.
    pub fn spawn(self: &Arc<Self>, cancel: &CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    }

    async fn run(&self, cancel: CancellationToken) {
        if let Err(e) = self.reconcile_stale_running().await {
            warn!(error = %e, "Failed to reconcile stale running flags");
        }

        let mut rx = self.store.observe();
        let mut last_required: HashMap<BackupCategory, u64> = HashMap::new();

        let initial = rx.borrow_and_update().clone();
        self.evaluate(&initial, &mut last_required).await;

        let mut retry = tokio::time::interval(self.retry_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.slots.abort_all().await;
                    debug!("Scheduler stopped, all pending jobs aborted");
                    break;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let map = rx.borrow_and_update().clone();
                    self.evaluate(&map, &mut last_required).await;
                }
                _ = retry.tick() => {
                    self.retry_stale_pending().await;
                }
            }
        }
    }

    /// Periodic sweep pass: re-schedule categories that are still pending but
    /// have no live job. This is what retries a failed backup without waiting
    /// for another change event.
    async fn retry_stale_pending(&self) {
        if self.flags.is_suppressed() {
            return;
        }
        let snapshot = self.store.snapshot().await;
        for (category, status) in snapshot {
            if !category.is_backup_capable() {
                continue;
            }
            if status.is_required() && !status.running && !self.slots.is_active(category).await {
                debug!(category = %category, required_at = status.required_at, "Re-scheduling pending category");
                self.schedule(category).await;
            }
        }
    }

    async fn evaluate(
        &self,
        map: &StatusMap,
        last_required: &mut HashMap<BackupCategory, u64>,
    ) {
        for (&category, status) in map {
            if !category.is_backup_capable() {
                continue;
            }
            let prev = last_required.get(&category).copied();
            // On the very first pass any pending category qualifies: that is
            // the carried-over work of the previous app session. Afterwards
            // only an advancing required_at re-triggers, so a failed run does
            // not hot-loop.
            let triggered = match prev {
                Some(p) => status.required_at > p,
                None => status.is_required(),
            };
            last_required.insert(category, status.required_at.max(prev.unwrap_or(0)));

            if triggered && status.is_required() && !status.running && !self.flags.is_suppressed() {
                self.schedule(category).await;
            }
        }
    }

    /// Install (or restart) the category's debounce job.
    async fn schedule(&self, category: BackupCategory) {
        let store = self.store.clone();
        let executor = self.executor.clone();
        let flags = self.flags.clone();
        let slots = self.slots.clone();
        let debounce = self.debounce;

        debug!(category = %category, "Backup scheduled");
        let gate = CancellationToken::new();
        let job_id = SlotHandle::next_id();
        let task = tokio::spawn({
            let gate = gate.clone();
            async move {
                // The gate is honored only while waiting out the debounce: a
                // replacement arriving later finds this job already executing
                // and must let it run to completion, otherwise the committed
                // `running` flag would be stranded until the next session.
                tokio::select! {
                    _ = gate.cancelled() => {
                        debug!(category = %category, "Debounce restarted by a newer change");
                        return;
                    }
                    _ = tokio::time::sleep(debounce) => {}
                }

                let status = store.get(category).await;
                if !status.is_required() || status.running || flags.is_suppressed() {
                    debug!(category = %category, "Debounce elapsed, backup no longer needed");
                } else if let Err(e) = executor.execute(category).await {
                    warn!(category = %category, error = %e, "Backup failed, category stays pending");
                }
                slots.complete(category, job_id).await;
            }
        });
        self.slots
            .replace(category, SlotHandle::new(job_id, gate, task.abort_handle()))
            .await;
    }

    /// Clear persisted `running = true` for categories with no live job.
    ///
    /// A crash mid-backup leaves the flag set on disk; trusting it would keep
    /// the category stuck forever.
    pub async fn reconcile_stale_running(&self) -> anyhow::Result<()> {
        let snapshot = self.store.snapshot().await;
        for (category, status) in snapshot {
            if status.running && !self.slots.is_active(category).await {
                warn!(category = %category, "Clearing stale running flag from previous session");
                self.store
                    .update(category, |s| BackupStatus { running: false, ..s })
                    .await?;
            }
        }
        Ok(())
    }

    /// Mark every backup-capable category required (bulk/initial backup after
    /// wallet creation or restore).
    pub async fn schedule_all(&self) -> anyhow::Result<()> {
        let now = self.clock.now_ms();
        info!(now, "Scheduling backup of all categories");
        for category in BACKUP_CATEGORIES {
            self.store
                .update(category, |s| BackupStatus { required_at: now, ..s })
                .await?;
        }
        Ok(())
    }
}
