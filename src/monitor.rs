//! Failure monitor - detects categories stuck in "required but never synced".
//!
//! A periodic sweep flags categories whose pending duration crossed the stale
//! threshold and raises one aggregated user-facing alert, throttled to at
//! most one per cooldown window no matter how many categories are overdue or
//! how many sweeps observe them.

use crate::category::BackupCategory;
use crate::clock::Clock;
use crate::sources::{AlertSeverity, AlertSink};
use crate::status::StatusStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct FailureMonitor {
    store: Arc<StatusStore>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    stale_threshold_ms: u64,
    cooldown_ms: u64,
    last_alert_at: Mutex<Option<u64>>,
}

impl FailureMonitor {
    pub fn new(
        store: Arc<StatusStore>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        stale_threshold_ms: u64,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            store,
            alerts,
            clock,
            interval,
            stale_threshold_ms,
            cooldown_ms,
            last_alert_at: Mutex::new(None),
        }
    }

    /// Run periodic sweeps until cancelled.
    pub fn spawn(self: &Arc<Self>, cancel: &CancellationToken) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => monitor.sweep().await,
                }
            }
        })
    }

    /// One sweep over all categories' statuses.
    pub async fn sweep(&self) {
        let now = self.clock.now_ms();
        let snapshot = self.store.snapshot().await;

        let mut overdue: Vec<BackupCategory> = snapshot
            .into_iter()
            .filter(|(_, status)| {
                status.is_required() && now.saturating_sub(status.required_at) > self.stale_threshold_ms
            })
            .map(|(category, _)| category)
            .collect();

        if overdue.is_empty() {
            return;
        }
        overdue.sort_by_key(|c| c.key());

        {
            let mut last = self.last_alert_at.lock().unwrap();
            if let Some(prev) = *last {
                if now.saturating_sub(prev) < self.cooldown_ms {
                    debug!(?overdue, "Overdue backups detected, alert throttled");
                    return;
                }
            }
            *last = Some(now);
        }

        let names: Vec<&str> = overdue.iter().map(|c| c.key()).collect();
        warn!(categories = ?names, "Backup overdue, raising user alert");
        self.alerts.alert(
            AlertSeverity::Warning,
            "Wallet backup failed",
            &format!(
                "Backup of {} has not completed in a while. Recent changes may not be recoverable.",
                names.join(", ")
            ),
        );
    }
}
