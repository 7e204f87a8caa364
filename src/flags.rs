//! Global suppression flags shared between components.
//!
//! `is_restoring` is owned by the restore orchestrator, `is_wiping` by the
//! host's wallet-wipe flow. The binder and scheduler only read them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct SuppressionFlags {
    restoring: AtomicBool,
    wiping: AtomicBool,
}

impl SuppressionFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True while either a full restore or a wallet wipe is in progress.
    /// While suppressed, change events are dropped and no backup is scheduled.
    pub fn is_suppressed(&self) -> bool {
        self.restoring.load(Ordering::SeqCst) || self.wiping.load(Ordering::SeqCst)
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.load(Ordering::SeqCst)
    }

    pub fn set_wiping(&self, wiping: bool) {
        self.wiping.store(wiping, Ordering::SeqCst);
    }

    /// Raise `is_restoring` for the lifetime of the returned guard. The flag
    /// is cleared on drop, on every exit path.
    pub fn begin_restore(self: &Arc<Self>) -> RestoreGuard {
        self.restoring.store(true, Ordering::SeqCst);
        RestoreGuard {
            flags: Arc::clone(self),
        }
    }
}

pub struct RestoreGuard {
    flags: Arc<SuppressionFlags>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        self.flags.restoring.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_guard_clears_on_drop() {
        let flags = SuppressionFlags::new();
        assert!(!flags.is_suppressed());
        {
            let _guard = flags.begin_restore();
            assert!(flags.is_restoring());
            assert!(flags.is_suppressed());
        }
        assert!(!flags.is_restoring());
        assert!(!flags.is_suppressed());
    }

    #[test]
    fn test_wiping_suppresses() {
        let flags = SuppressionFlags::new();
        flags.set_wiping(true);
        assert!(flags.is_suppressed());
        assert!(!flags.is_restoring());
        flags.set_wiping(false);
        assert!(!flags.is_suppressed());
    }
}
