//! Mock collaborators shared by the module tests.

use crate::category::BackupCategory;
use crate::sources::{AlertSeverity, AlertSink, CategorySource, ExternalSyncSource, RemoteBackupStore, SourceMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// In-memory remote store with fault injection and per-key put counters.
#[derive(Default)]
pub struct MockRemote {
    pub data: Mutex<HashMap<String, Vec<u8>>>,
    pub put_counts: Mutex<HashMap<String, usize>>,
    pub fail_puts: AtomicBool,
    pub fail_gets: AtomicBool,
    /// Holds each put open for this long, to test behavior mid-upload.
    pub put_delay_ms: AtomicU64,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_count(&self, key: &str) -> usize {
        self.put_counts.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn insert(&self, key: &str, value: Vec<u8>) {
        self.data.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait::async_trait]
impl RemoteBackupStore for MockRemote {
    async fn put(&self, key: &str, value: Vec<u8>) -> anyhow::Result<()> {
        *self
            .put_counts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert(0) += 1;
        let delay = self.put_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.fail_puts.load(Ordering::SeqCst) {
            anyhow::bail!("remote store unavailable");
        }
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            anyhow::bail!("remote store unavailable");
        }
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
}

/// Category data owner with a drivable change stream.
pub struct MockSource {
    changes_tx: watch::Sender<u64>,
    pub snapshot: Mutex<Vec<u8>>,
    pub applied: Mutex<Vec<Vec<u8>>>,
    pub snapshot_calls: AtomicUsize,
    pub fail_snapshot: AtomicBool,
    pub fail_apply: AtomicBool,
}

impl MockSource {
    pub fn new() -> Arc<Self> {
        let (changes_tx, _) = watch::channel(0);
        Arc::new(Self {
            changes_tx,
            snapshot: Mutex::new(b"snapshot".to_vec()),
            applied: Mutex::new(Vec::new()),
            snapshot_calls: AtomicUsize::new(0),
            fail_snapshot: AtomicBool::new(false),
            fail_apply: AtomicBool::new(false),
        })
    }

    /// Emit a change notification.
    pub fn touch(&self) {
        self.changes_tx.send_modify(|v| *v += 1);
    }
}

#[async_trait::async_trait]
impl CategorySource for MockSource {
    fn changes(&self) -> watch::Receiver<u64> {
        self.changes_tx.subscribe()
    }

    async fn snapshot_bytes(&self) -> anyhow::Result<Vec<u8>> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_snapshot.load(Ordering::SeqCst) {
            anyhow::bail!("serialization failed");
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn apply_bytes(&self, bytes: Vec<u8>) -> anyhow::Result<()> {
        if self.fail_apply.load(Ordering::SeqCst) {
            anyhow::bail!("apply failed");
        }
        self.applied.lock().unwrap().push(bytes);
        Ok(())
    }
}

/// Lightning-style collaborator emitting sync-completed timestamps.
pub struct MockExternalSync {
    tx: watch::Sender<Option<u64>>,
}

impl MockExternalSync {
    pub fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(None);
        Arc::new(Self { tx })
    }

    pub fn sync_completed(&self, at_ms: u64) {
        self.tx.send_replace(Some(at_ms));
    }
}

impl ExternalSyncSource for MockExternalSync {
    fn sync_events(&self) -> watch::Receiver<Option<u64>> {
        self.tx.subscribe()
    }
}

/// Records alerts instead of showing them.
#[derive(Default)]
pub struct MockAlerts {
    pub alerts: Mutex<Vec<(AlertSeverity, String, String)>>,
}

impl MockAlerts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl AlertSink for MockAlerts {
    fn alert(&self, severity: AlertSeverity, title: &str, body: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((severity, title.to_string(), body.to_string()));
    }
}

/// A source map covering every backup-capable category.
pub fn full_source_map() -> (SourceMap, HashMap<BackupCategory, Arc<MockSource>>) {
    let mut sources = SourceMap::new();
    let mut mocks = HashMap::new();
    for category in crate::category::BACKUP_CATEGORIES {
        let source = MockSource::new();
        sources.insert(category, source.clone() as Arc<dyn CategorySource>);
        mocks.insert(category, source);
    }
    (sources, mocks)
}
