//! Backup categories - the closed set of state domains subject to backup.

use serde::{Deserialize, Serialize};

/// A named domain of application state tracked for backup/restore.
///
/// The set is static; there is no dynamic registration. `Lightning` is the
/// exception: its persistence is delegated entirely to the node's own backup
/// subsystem, so it is tracked for display only and never handed to the
/// executor or the restore orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupCategory {
    Metadata,
    Settings,
    Wallet,
    Counterparty,
    Activity,
    Widgets,
    Lightning,
}

/// Categories this subsystem backs up itself (everything except `Lightning`).
pub const BACKUP_CATEGORIES: [BackupCategory; 6] = [
    BackupCategory::Metadata,
    BackupCategory::Settings,
    BackupCategory::Wallet,
    BackupCategory::Counterparty,
    BackupCategory::Activity,
    BackupCategory::Widgets,
];

/// Fixed restore order. Categories whose restoration can trigger address
/// rotation or cache invalidation run before categories that depend on clean
/// derived state.
pub const RESTORE_ORDER: [BackupCategory; 6] = [
    BackupCategory::Metadata,
    BackupCategory::Settings,
    BackupCategory::Wallet,
    BackupCategory::Counterparty,
    BackupCategory::Activity,
    BackupCategory::Widgets,
];

impl BackupCategory {
    /// Stable name, used as the remote-store key for this category.
    pub fn key(&self) -> &'static str {
        match self {
            BackupCategory::Metadata => "metadata",
            BackupCategory::Settings => "settings",
            BackupCategory::Wallet => "wallet",
            BackupCategory::Counterparty => "counterparty",
            BackupCategory::Activity => "activity",
            BackupCategory::Widgets => "widgets",
            BackupCategory::Lightning => "lightning",
        }
    }

    /// Whether this subsystem performs the category's backup itself.
    pub fn is_backup_capable(&self) -> bool {
        !matches!(self, BackupCategory::Lightning)
    }
}

impl std::fmt::Display for BackupCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_and_stable() {
        let mut keys: Vec<&str> = BACKUP_CATEGORIES.iter().map(|c| c.key()).collect();
        keys.push(BackupCategory::Lightning.key());
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(keys.len(), deduped.len());
    }

    #[test]
    fn test_lightning_excluded_from_backup_set() {
        assert!(!BACKUP_CATEGORIES.contains(&BackupCategory::Lightning));
        assert!(!BackupCategory::Lightning.is_backup_capable());
        assert!(BackupCategory::Settings.is_backup_capable());
    }

    #[test]
    fn test_restore_order_covers_all_backup_categories() {
        for c in BACKUP_CATEGORIES {
            assert!(RESTORE_ORDER.contains(&c));
        }
        // Metadata restores first: it can rotate addresses that later
        // categories depend on.
        assert_eq!(RESTORE_ORDER[0], BackupCategory::Metadata);
        assert_eq!(RESTORE_ORDER[1], BackupCategory::Settings);
        assert_eq!(RESTORE_ORDER[2], BackupCategory::Wallet);
    }

    #[test]
    fn test_serde_uses_key_names() {
        let json = serde_json::to_string(&BackupCategory::Counterparty).unwrap();
        assert_eq!(json, "\"counterparty\"");
        let back: BackupCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BackupCategory::Counterparty);
    }
}
