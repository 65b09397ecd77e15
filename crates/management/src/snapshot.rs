//! JSON snapshot of the whole store, written to disk on an interval and read
//! back at startup.

use crate::models::{AuditLogEntry, Preferences};
use crate::store::ResellerStore;
use chrono::{DateTime, Utc};
use reseller_core::types::{Account, Customer, CustomerNote, FinancialRecord, Platform};
use reseller_core::ResellerResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub taken_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub notes: Vec<CustomerNote>,
    #[serde(default)]
    pub records: Vec<FinancialRecord>,
    #[serde(default)]
    pub preferences: HashMap<Uuid, Preferences>,
    #[serde(default)]
    pub audit_log: Vec<AuditLogEntry>,
}

impl Snapshot {
    pub fn row_count(&self) -> usize {
        self.platforms.len() + self.accounts.len() + self.customers.len() + self.notes.len() + self.records.len()
    }
}

fn values<V: Clone>(map: &dashmap::DashMap<Uuid, V>) -> Vec<V> {
    map.iter().map(|r| r.value().clone()).collect()
}

impl ResellerStore {
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            taken_at: Some(Utc::now()),
            platforms: values(&self.platforms),
            accounts: values(&self.accounts),
            customers: values(&self.customers),
            notes: values(&self.notes),
            records: values(&self.records),
            preferences: self
                .preferences
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect(),
            audit_log: values(&self.audit_log),
        }
    }

    /// Replace the store contents with `snapshot`.
    pub fn import_snapshot(&self, snapshot: Snapshot) {
        self.platforms.clear();
        self.accounts.clear();
        self.customers.clear();
        self.notes.clear();
        self.records.clear();
        self.preferences.clear();
        self.audit_log.clear();

        let rows = snapshot.row_count();
        for p in snapshot.platforms { self.platforms.insert(p.id, p); }
        for a in snapshot.accounts { self.accounts.insert(a.id, a); }
        for c in snapshot.customers { self.customers.insert(c.id, c); }
        for n in snapshot.notes { self.notes.insert(n.id, n); }
        for r in snapshot.records { self.records.insert(r.id, r); }
        for (owner, prefs) in snapshot.preferences { self.preferences.insert(owner, prefs); }
        for e in snapshot.audit_log { self.audit_log.insert(e.id, e); }
        info!(rows, "snapshot imported");
    }

    /// Write the snapshot next to `path` and rename it into place.
    pub fn save_snapshot(&self, path: &Path) -> ResellerResult<()> {
        let snapshot = self.export_snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        metrics::counter!("storage.snapshots.saved").increment(1);
        Ok(())
    }

    /// Load `path` into the store. `Ok(false)` when the file does not exist yet.
    pub fn load_snapshot(&self, path: &Path) -> ResellerResult<bool> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(found = snapshot.version, expected = SNAPSHOT_VERSION, "snapshot version mismatch, loading anyway");
        }
        self.import_snapshot(snapshot);
        Ok(true)
    }
}

/// Periodically flush the store to `path` until the runtime shuts down.
pub fn spawn_flush_task(store: Arc<ResellerStore>, path: PathBuf, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let store = store.clone();
            let target = path.clone();
            match tokio::task::spawn_blocking(move || store.save_snapshot(&target)).await {
                Ok(Ok(())) => tracing::debug!(path = %path.display(), "snapshot flushed"),
                Ok(Err(e)) => warn!(error = %e, path = %path.display(), "snapshot flush failed"),
                Err(e) => warn!(error = %e, "snapshot flush task panicked"),
            }
        }
    })
}
