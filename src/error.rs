//! Typed error for backup/restore operations.

/// Failure classes surfaced by the executor and restore paths.
///
/// Remote and source failures are transient from the subsystem's point of
/// view: the category stays pending and is retried on the next trigger.
#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    /// Remote backup store rejected or failed a put/get.
    #[error("remote store operation failed: {0}")]
    Remote(anyhow::Error),

    /// Category data source failed to snapshot or apply bytes.
    #[error("data source operation failed: {0}")]
    Source(anyhow::Error),

    /// Payload envelope could not be encoded or decoded.
    #[error("payload codec failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// Payload was written by a newer release than this reader understands.
    #[error("unsupported payload version {0}")]
    UnsupportedPayloadVersion(u32),

    /// Status store persistence failed.
    #[error("status store update failed: {0}")]
    Status(anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
