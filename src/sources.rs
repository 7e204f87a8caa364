//! Collaborator contracts.
//!
//! Everything this subsystem talks to lives behind a trait here: the remote
//! blob store, the per-category data owners, the externally-managed Lightning
//! backup, the alerting sink. Implementations belong to the host application.

use crate::category::BackupCategory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Remote opaque key-value backup store.
///
/// Absence of a key is `Ok(None)`, never an error. Transport, auth, and
/// per-call timeouts are the implementor's responsibility.
#[async_trait::async_trait]
pub trait RemoteBackupStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> anyhow::Result<()>;
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Data owner for one backup-capable category.
#[async_trait::async_trait]
pub trait CategorySource: Send + Sync {
    /// Change notifications as a version counter. A fresh receiver's current
    /// value is the already-known state, not a new change.
    fn changes(&self) -> watch::Receiver<u64>;

    /// Serialize the category's current data into an opaque blob.
    async fn snapshot_bytes(&self) -> anyhow::Result<Vec<u8>>;

    /// Apply a restored blob to the category's data.
    async fn apply_bytes(&self, bytes: Vec<u8>) -> anyhow::Result<()>;
}

/// Collaborator for the externally-managed `Lightning` category. It is never
/// asked to snapshot or restore; it only reports when its own backup
/// subsystem last completed a sync (unix ms, `None` = never).
pub trait ExternalSyncSource: Send + Sync {
    fn sync_events(&self) -> watch::Receiver<Option<u64>>;
}

/// Alert severity for the failure monitor's user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

/// Fire-and-forget notification channel toward the user.
pub trait AlertSink: Send + Sync {
    fn alert(&self, severity: AlertSeverity, title: &str, body: &str);
}

/// Category → data owner map handed to the subsystem at construction.
pub type SourceMap = HashMap<BackupCategory, Arc<dyn CategorySource>>;
