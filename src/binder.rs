//! Change-to-required binder.
//!
//! One long-lived task per category turns that category's change stream into
//! `required_at` marks in the status store. The stream's replayed current
//! value is explicitly marked seen before the loop so a fresh subscription
//! never triggers a spurious backup at startup.

use crate::category::BackupCategory;
use crate::clock::Clock;
use crate::flags::SuppressionFlags;
use crate::sources::{ExternalSyncSource, SourceMap};
use crate::status::{BackupStatus, StatusStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ChangeBinder {
    store: Arc<StatusStore>,
    sources: Arc<SourceMap>,
    external: Option<Arc<dyn ExternalSyncSource>>,
    flags: Arc<SuppressionFlags>,
    clock: Arc<dyn Clock>,
}

impl ChangeBinder {
    pub fn new(
        store: Arc<StatusStore>,
        sources: Arc<SourceMap>,
        external: Option<Arc<dyn ExternalSyncSource>>,
        flags: Arc<SuppressionFlags>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sources,
            external,
            flags,
            clock,
        }
    }

    /// Spawn one subscription task per registered category, plus the
    /// externally-managed Lightning listener when present. Tasks run until
    /// the token is cancelled or their source hangs up.
    pub fn spawn_all(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        for (&category, source) in self.sources.iter() {
            let mut rx = source.changes();
            let store = self.store.clone();
            let flags = self.flags.clone();
            let clock = self.clock.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                // The replayed current value is already-known state.
                let _ = rx.borrow_and_update();
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                debug!(category = %category, "Change stream closed");
                                break;
                            }
                            if flags.is_suppressed() {
                                debug!(category = %category, "Change dropped while restoring/wiping");
                                continue;
                            }
                            let now = clock.now_ms();
                            match store
                                .update(category, |s| BackupStatus { required_at: now, ..s })
                                .await
                            {
                                Ok(_) => debug!(category = %category, required_at = now, "Backup required"),
                                Err(e) => warn!(category = %category, error = %e, "Failed to mark backup required"),
                            }
                        }
                    }
                }
            }));
        }

        if let Some(external) = &self.external {
            let mut rx = external.sync_events();
            let store = self.store.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let _ = rx.borrow_and_update();
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let Some(synced_at) = *rx.borrow_and_update() else {
                                continue;
                            };
                            // Lightning's backup is owned elsewhere; we only
                            // mirror its completion time for display.
                            let result = store
                                .update(BackupCategory::Lightning, |_| BackupStatus {
                                    running: false,
                                    synced_at,
                                    required_at: synced_at,
                                })
                                .await;
                            if let Err(e) = result {
                                warn!(error = %e, "Failed to record Lightning sync time");
                            }
                        }
                    }
                }
            }));
        }

        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test::ManualClock;
    use crate::testutil::{MockExternalSync, MockSource};
    use std::time::Duration;

    struct Fixture {
        store: Arc<StatusStore>,
        source: Arc<MockSource>,
        external: Arc<MockExternalSync>,
        flags: Arc<SuppressionFlags>,
        clock: Arc<ManualClock>,
        cancel: CancellationToken,
        _dir: tempfile::TempDir,
    }

    async fn spawn_fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            StatusStore::open(dir.path().join("status.json"))
                .await
                .unwrap(),
        );
        let source = MockSource::new();
        let external = MockExternalSync::new();
        let flags = SuppressionFlags::new();
        let clock = Arc::new(ManualClock::at(1_000));
        let mut sources = SourceMap::new();
        sources.insert(BackupCategory::Settings, source.clone() as _);

        let binder = ChangeBinder::new(
            store.clone(),
            Arc::new(sources),
            Some(external.clone() as _),
            flags.clone(),
            clock.clone(),
        );
        let cancel = CancellationToken::new();
        binder.spawn_all(&cancel);

        Fixture {
            store,
            source,
            external,
            flags,
            clock,
            cancel,
            _dir: dir,
        }
    }

    async fn wait_for(
        store: &StatusStore,
        category: BackupCategory,
        pred: impl Fn(&BackupStatus) -> bool,
    ) {
        let mut rx = store.observe();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if pred(&rx.borrow_and_update()[&category]) {
                    return;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("status never reached expected state");
    }

    #[tokio::test]
    async fn test_initial_emission_does_not_mark_required() {
        let f = spawn_fixture().await;
        // Let the binder tasks subscribe and settle.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let status = f.store.get(BackupCategory::Settings).await;
        assert_eq!(status.required_at, 0);
        assert!(!status.is_required());
        f.cancel.cancel();
    }

    #[tokio::test]
    async fn test_change_marks_required_at_clock_time() {
        let f = spawn_fixture().await;
        f.clock.set(5_000);
        f.source.touch();
        wait_for(&f.store, BackupCategory::Settings, |s| s.required_at == 5_000).await;
        assert!(f.store.get(BackupCategory::Settings).await.is_required());
        f.cancel.cancel();
    }

    #[tokio::test]
    async fn test_changes_dropped_while_suppressed() {
        let f = spawn_fixture().await;
        f.flags.set_wiping(true);
        f.source.touch();
        f.source.touch();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.store.get(BackupCategory::Settings).await.required_at, 0);

        // Suppression lifted: the next change registers.
        f.flags.set_wiping(false);
        f.clock.set(7_000);
        f.source.touch();
        wait_for(&f.store, BackupCategory::Settings, |s| s.required_at == 7_000).await;
        f.cancel.cancel();
    }

    #[tokio::test]
    async fn test_lightning_mirrors_sync_completion() {
        let f = spawn_fixture().await;
        f.external.sync_completed(9_000);
        wait_for(&f.store, BackupCategory::Lightning, |s| s.synced_at == 9_000).await;
        let status = f.store.get(BackupCategory::Lightning).await;
        assert_eq!(status.required_at, 9_000);
        assert!(!status.running);
        assert!(!status.is_required());
        f.cancel.cancel();
    }

    #[tokio::test]
    async fn test_cancel_stops_subscription() {
        let f = spawn_fixture().await;
        f.cancel.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.source.touch();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.store.get(BackupCategory::Settings).await.required_at, 0);
    }
}
