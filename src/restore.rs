//! Full restore from the remote store.
//!
//! Runs once, early in the wallet-unlock lifecycle, before the scheduler is
//! started. Categories restore sequentially in a fixed order because later
//! categories may depend on derived state produced by earlier ones.

use crate::category::{BackupCategory, RESTORE_ORDER};
use crate::error::BackupError;
use crate::flags::SuppressionFlags;
use crate::payload::BackupPayload;
use crate::sources::{RemoteBackupStore, SourceMap};
use crate::status::{BackupStatus, StatusStore};
use std::sync::Arc;
use tracing::{info, warn};

pub struct RestoreOrchestrator {
    store: Arc<StatusStore>,
    remote: Arc<dyn RemoteBackupStore>,
    sources: Arc<SourceMap>,
    flags: Arc<SuppressionFlags>,
}

impl RestoreOrchestrator {
    pub fn new(
        store: Arc<StatusStore>,
        remote: Arc<dyn RemoteBackupStore>,
        sources: Arc<SourceMap>,
        flags: Arc<SuppressionFlags>,
    ) -> Self {
        Self {
            store,
            remote,
            sources,
            flags,
        }
    }

    /// Fetch and apply the latest remote payload for every category, in
    /// restore order. Each category is fault-isolated: a failure is logged
    /// and the sweep continues. `is_restoring` is held for the whole run and
    /// cleared on every exit path.
    pub async fn restore_all(&self) -> anyhow::Result<()> {
        let _guard = self.flags.begin_restore();
        info!("Starting full restore from remote backup store");

        let mut restored = 0usize;
        let mut failed = 0usize;
        for category in RESTORE_ORDER {
            match self.restore_category(category).await {
                Ok(applied) => {
                    if applied {
                        restored += 1;
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(category = %category, error = %e, "Category restore failed, continuing with remaining categories");
                }
            }
        }

        info!(restored, failed, "Full restore finished");
        Ok(())
    }

    /// Restore one category. Returns `Ok(false)` when no remote payload
    /// exists (not an error: a fresh wallet has nothing to restore).
    async fn restore_category(&self, category: BackupCategory) -> Result<bool, BackupError> {
        let source = self
            .sources
            .get(&category)
            .ok_or_else(|| anyhow::anyhow!("no data source registered for category {category}"))?;

        let Some(bytes) = self
            .remote
            .get(category.key())
            .await
            .map_err(BackupError::Remote)?
        else {
            info!(category = %category, "No remote backup found, skipping");
            return Ok(false);
        };

        let payload = BackupPayload::decode(&bytes)?;
        source
            .apply_bytes(payload.data)
            .await
            .map_err(BackupError::Source)?;

        // Stamp both timestamps with the payload's creation time so freshly
        // restored data is not immediately re-flagged for backup.
        self.store
            .update(category, |_| BackupStatus {
                running: false,
                synced_at: payload.created_at,
                required_at: payload.created_at,
            })
            .await
            .map_err(BackupError::Status)?;

        info!(category = %category, created_at = payload.created_at, "Category restored");
        Ok(true)
    }
}
