//! Persisted, observable backup status per category.
//!
//! The status store is the single shared mutable resource of the subsystem.
//! All mutation goes through [`StatusStore::update`], which serializes
//! callers behind one lock, rewrites the on-disk JSON document, and publishes
//! the new map on a watch channel for observers.

use crate::category::{BackupCategory, BACKUP_CATEGORIES};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{watch, Mutex};

/// Per-category backup status.
///
/// A category is *pending* iff `required_at > synced_at`. `running` is
/// transient: it is only meaningful while the owning process is alive and is
/// reconciled against the live job set at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupStatus {
    #[serde(default)]
    pub running: bool,
    /// Unix ms of the last successful remote write. 0 = never synced.
    #[serde(default)]
    pub synced_at: u64,
    /// Unix ms the category was last marked dirty. 0 = never.
    #[serde(default)]
    pub required_at: u64,
}

impl BackupStatus {
    pub fn is_required(&self) -> bool {
        self.required_at > self.synced_at
    }
}

pub type StatusMap = HashMap<BackupCategory, BackupStatus>;

fn default_map() -> StatusMap {
    let mut map = StatusMap::new();
    for category in BACKUP_CATEGORIES {
        map.insert(category, BackupStatus::default());
    }
    map.insert(BackupCategory::Lightning, BackupStatus::default());
    map
}

pub struct StatusStore {
    path: PathBuf,
    state: Mutex<StatusMap>,
    tx: watch::Sender<StatusMap>,
}

impl StatusStore {
    /// Load the persisted status map, falling back to defaults for a missing
    /// file or missing categories.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut map = default_map();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<StatusMap>(&bytes) {
                Ok(persisted) => {
                    for (category, status) in persisted {
                        map.insert(category, status);
                    }
                }
                Err(e) => {
                    // A corrupt status file only loses bookkeeping, not wallet
                    // data. Start fresh rather than refusing to run.
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt status file, starting with defaults");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("reading status file {}", path.display()))
            }
        }

        let (tx, _) = watch::channel(map.clone());
        Ok(Self {
            path,
            state: Mutex::new(map),
            tx,
        })
    }

    /// Observe the status map. The receiver replays the latest value.
    pub fn observe(&self) -> watch::Receiver<StatusMap> {
        self.tx.subscribe()
    }

    /// Current status for one category.
    pub async fn get(&self, category: BackupCategory) -> BackupStatus {
        self.state
            .lock()
            .await
            .get(&category)
            .copied()
            .unwrap_or_default()
    }

    /// Current full map.
    pub async fn snapshot(&self) -> StatusMap {
        self.state.lock().await.clone()
    }

    /// Atomic read-modify-write for one category's status.
    ///
    /// Callers are responsible for invariant-preserving transforms. The lock
    /// is held across the disk write, so concurrent updates cannot be lost.
    pub async fn update<F>(&self, category: BackupCategory, transform: F) -> anyhow::Result<BackupStatus>
    where
        F: FnOnce(BackupStatus) -> BackupStatus,
    {
        let mut state = self.state.lock().await;
        let current = state.get(&category).copied().unwrap_or_default();
        let next = transform(current);
        state.insert(category, next);
        let map = state.clone();
        // Publish before the write: observers track in-memory truth even when
        // the disk is briefly unavailable.
        self.tx.send_replace(map.clone());
        self.persist(&map).await?;
        Ok(next)
    }

    /// Reset every category to defaults (wallet wipe).
    pub async fn reset(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        *state = default_map();
        let map = state.clone();
        self.tx.send_replace(map.clone());
        self.persist(&map).await
    }

    async fn persist(&self, map: &StatusMap) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("writing status file {}", self.path.display()))
    }
}
