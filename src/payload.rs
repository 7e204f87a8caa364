//! Versioned payload envelope written to the remote store.
//!
//! The orchestration layer never interprets the inner bytes; it only wraps
//! them with a version and the snapshot's creation time so that a restore can
//! stamp the status store without re-flagging freshly restored data.

use crate::error::BackupError;
use serde::{Deserialize, Serialize};

/// Current envelope version. Readers reject anything newer.
pub const PAYLOAD_VERSION: u32 = 1;

/// Opaque per-category backup blob plus envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub version: u32,
    /// Unix ms at which the snapshot was taken.
    pub created_at: u64,
    /// Category snapshot bytes, opaque to this subsystem.
    pub data: Vec<u8>,
}

impl BackupPayload {
    pub fn new(created_at: u64, data: Vec<u8>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            created_at,
            data,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, BackupError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, BackupError> {
        let payload: BackupPayload = serde_json::from_slice(bytes)?;
        if payload.version > PAYLOAD_VERSION {
            return Err(BackupError::UnsupportedPayloadVersion(payload.version));
        }
        Ok(payload)
    }
}
