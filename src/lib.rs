//! Wallet Backup Library
//!
//! Backup/restore orchestration for a Bitcoin/Lightning wallet: keeps a
//! closed set of local state domains mirrored to a remote opaque key-value
//! store (debounced, single-flight per category) and reconstructs local state
//! from that store on demand.

pub mod binder;
pub mod category;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod flags;
pub mod jobs;
pub mod monitor;
pub mod payload;
pub mod restore;
pub mod scheduler;
pub mod service;
pub mod sources;
pub mod status;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use category::{BackupCategory, BACKUP_CATEGORIES, RESTORE_ORDER};
pub use clock::{Clock, SystemClock};
pub use config::BackupConfig;
pub use error::BackupError;
pub use payload::BackupPayload;
pub use service::BackupService;
pub use sources::{
    AlertSeverity, AlertSink, CategorySource, ExternalSyncSource, RemoteBackupStore, SourceMap,
};
pub use status::{BackupStatus, StatusMap, StatusStore};
