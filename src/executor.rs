//! Backup executor - serializes one category and writes it to the remote store.

use crate::category::BackupCategory;
use crate::clock::Clock;
use crate::error::BackupError;
use crate::payload::BackupPayload;
use crate::sources::{CategorySource, RemoteBackupStore, SourceMap};
use crate::status::{BackupStatus, StatusStore};
use std::sync::Arc;
use tracing::{error, info};

pub struct BackupExecutor {
    store: Arc<StatusStore>,
    remote: Arc<dyn RemoteBackupStore>,
    sources: Arc<SourceMap>,
    clock: Arc<dyn Clock>,
}

impl BackupExecutor {
    pub fn new(
        store: Arc<StatusStore>,
        remote: Arc<dyn RemoteBackupStore>,
        sources: Arc<SourceMap>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            remote,
            sources,
            clock,
        }
    }

    /// Back up one category's current data to the remote store.
    ///
    /// On failure `required_at` is preserved, so the category stays pending
    /// and eligible for retry. Errors come back as a result; nothing panics
    /// across this boundary.
    pub async fn execute(&self, category: BackupCategory) -> Result<(), BackupError> {
        let source = self
            .sources
            .get(&category)
            .ok_or_else(|| anyhow::anyhow!("no data source registered for category {category}"))?
            .clone();

        let started_at = self.clock.now_ms();
        // Touch required_at at start so a change arriving mid-backup cannot
        // be mistaken for already-synced data.
        self.store
            .update(category, |s| BackupStatus {
                running: true,
                required_at: started_at,
                ..s
            })
            .await
            .map_err(BackupError::Status)?;

        info!(category = %category, "Backup started");

        let result = self.run(category, source).await;

        match &result {
            Ok(()) => {
                let synced_at = self.clock.now_ms();
                self.store
                    .update(category, |s| BackupStatus {
                        running: false,
                        synced_at,
                        ..s
                    })
                    .await
                    .map_err(BackupError::Status)?;
                info!(category = %category, synced_at, "Backup completed");
            }
            Err(e) => {
                // Only clear the running flag; required_at stays so the
                // category remains pending.
                self.store
                    .update(category, |s| BackupStatus {
                        running: false,
                        ..s
                    })
                    .await
                    .map_err(BackupError::Status)?;
                error!(category = %category, error = %e, "Backup failed");
            }
        }

        result
    }

    async fn run(
        &self,
        category: BackupCategory,
        source: Arc<dyn CategorySource>,
    ) -> Result<(), BackupError> {
        let data = source
            .snapshot_bytes()
            .await
            .map_err(BackupError::Source)?;
        let payload = BackupPayload::new(self.clock.now_ms(), data);
        let bytes = payload.encode()?;
        self.remote
            .put(category.key(), bytes)
            .await
            .map_err(BackupError::Remote)?;
        Ok(())
    }
}
