//! Per-category job slots with cancel-and-replace semantics.

use crate::category::BackupCategory;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to one scheduled backup job.
///
/// `cancel` is the soft path used when a re-trigger replaces the job: the
/// job honors it only while still in its debounce wait, so a job that has
/// started executing runs to completion and cannot strand a committed
/// `running` flag. `abort` is the hard path reserved for subsystem shutdown,
/// where the next start's reconcile clears anything left behind.
pub struct SlotHandle {
    id: u64,
    cancel: CancellationToken,
    abort: AbortHandle,
}

impl SlotHandle {
    pub fn next_id() -> u64 {
        NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
    }

    pub fn new(id: u64, cancel: CancellationToken, abort: AbortHandle) -> Self {
        Self { id, cancel, abort }
    }
}

/// Tracks at most one live backup job per category.
///
/// Registering a category whose slot is already occupied stands the previous
/// job down, which is what gives the scheduler its last-write-coalescing
/// debounce.
#[derive(Clone)]
pub struct JobSlots {
    slots: Arc<RwLock<HashMap<BackupCategory, SlotHandle>>>,
}

impl JobSlots {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Install a job in the category's slot, soft-cancelling any previous
    /// occupant.
    pub async fn replace(&self, category: BackupCategory, handle: SlotHandle) {
        let mut slots = self.slots.write().await;
        if let Some(previous) = slots.insert(category, handle) {
            previous.cancel.cancel();
        }
    }

    /// Remove a finished job from tracking. Guarded by id so a replaced job
    /// that ran to completion cannot evict its replacement's slot.
    pub async fn complete(&self, category: BackupCategory, id: u64) {
        let mut slots = self.slots.write().await;
        if slots.get(&category).map(|h| h.id) == Some(id) {
            slots.remove(&category);
        }
    }

    /// Abort every live job outright (shutdown path).
    pub async fn abort_all(&self) {
        let mut slots = self.slots.write().await;
        for (_, handle) in slots.drain() {
            handle.abort.abort();
        }
    }

    /// Whether the category currently has a live job.
    pub async fn is_active(&self, category: BackupCategory) -> bool {
        let slots = self.slots.read().await;
        slots
            .get(&category)
            .map(|h| !h.abort.is_finished())
            .unwrap_or(false)
    }

    pub async fn active_count(&self) -> usize {
        let slots = self.slots.read().await;
        slots.values().filter(|h| !h.abort.is_finished()).count()
    }
}

impl Default for JobSlots {
    fn default() -> Self {
        Self::new()
    }
}
