// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// ## Purpose
//
// Snapshots only need to live between a pre-update event and the matching
// post-save event, so a process-local map with per-entry expiry is enough.
//
// ## Crash Behavior
//
// - All snapshots are lost on restart
// - A save whose pre-update ran before the restart is skipped (no snapshot),
//   which is the same outcome as an expired snapshot

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::record::RecordId;
use crate::traits::snapshot_store::{Snapshot, SnapshotStore, SNAPSHOT_TTL_SECS};

#[derive(Debug, Default)]
struct Entries {
    snapshots: HashMap<RecordId, Snapshot>,
    pending: HashSet<RecordId>,
}

/// In-memory snapshot store with per-entry expiry
///
/// # Example
///
/// ```rust,no_run
/// use wrc_core::record::{ProductFields, Record};
/// use wrc_core::state::MemorySnapshotStore;
/// use wrc_core::traits::{Snapshot, SnapshotStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySnapshotStore::new();
///     let record = Record::product(7, ProductFields::default());
///
///     store.put(Snapshot::capture(&record).unwrap()).await?;
///     assert!(store.get(record.id).await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Entries>>,
    ttl: chrono::Duration,
}

impl MemorySnapshotStore {
    /// Create a store with the standard one-hour expiry
    pub fn new() -> Self {
        Self::with_ttl(chrono::Duration::seconds(SNAPSHOT_TTL_SECS))
    }

    /// Create a store with a custom expiry
    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Entries::default())),
            ttl,
        }
    }

    /// Configured expiry
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Number of stored snapshots, expired ones included
    pub async fn len(&self) -> usize {
        self.inner.read().await.snapshots.len()
    }

    /// Check if the store holds no snapshots
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.snapshots.is_empty()
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, snapshot: Snapshot) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.snapshots.insert(snapshot.record_id, snapshot);
        Ok(())
    }

    async fn get(&self, record_id: RecordId) -> Result<Option<Snapshot>, Error> {
        {
            let guard = self.inner.read().await;
            match guard.snapshots.get(&record_id) {
                None => return Ok(None),
                Some(snapshot) if !snapshot.is_expired(self.ttl) => {
                    return Ok(Some(snapshot.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: evict so later reads are cheap
        let mut guard = self.inner.write().await;
        if guard
            .snapshots
            .get(&record_id)
            .is_some_and(|s| s.is_expired(self.ttl))
        {
            guard.snapshots.remove(&record_id);
            guard.pending.remove(&record_id);
            tracing::debug!("Evicted expired snapshot for record {}", record_id);
        }
        Ok(None)
    }

    async fn remove(&self, record_id: RecordId) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.snapshots.remove(&record_id);
        guard.pending.remove(&record_id);
        Ok(())
    }

    async fn set_pending(&self, record_id: RecordId, pending: bool) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if pending {
            guard.pending.insert(record_id);
        } else {
            guard.pending.remove(&record_id);
        }
        Ok(())
    }

    async fn is_pending(&self, record_id: RecordId) -> Result<bool, Error> {
        Ok(self.inner.read().await.pending.contains(&record_id))
    }

    async fn purge_expired(&self) -> Result<usize, Error> {
        let mut guard = self.inner.write().await;
        let before = guard.snapshots.len();
        let ttl = self.ttl;
        let Entries { snapshots, pending } = &mut *guard;
        snapshots.retain(|id, s| {
            let live = !s.is_expired(ttl);
            if !live {
                pending.remove(id);
            }
            live
        });
        Ok(before - snapshots.len())
    }
}
