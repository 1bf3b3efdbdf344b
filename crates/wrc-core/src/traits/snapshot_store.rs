// # Snapshot Store Trait
//
// Holds the pre-update copy of a record's tracked fields until the matching
// post-save event consumes it.
//
// ## Concurrency
//
// Entries are keyed by record id and overwritten by the most recent
// pre-update event (last writer wins). The expiry bounds how long a stale
// snapshot can influence a later save. This is NOT a lock: two overlapping
// edits of the same record within the expiry window race, and the second
// post-save sees whichever snapshot was written last.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::record::{Record, RecordId};

/// Snapshot lifetime: one hour
pub const SNAPSHOT_TTL_SECS: i64 = 60 * 60;

/// Pre-update copy of a record's tracked fields
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    /// Record the snapshot belongs to
    pub record_id: RecordId,
    /// Tracked field values at capture time
    pub fields: BTreeMap<String, String>,
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from explicit field values
    pub fn new(record_id: RecordId, fields: BTreeMap<String, String>) -> Self {
        Self {
            record_id,
            fields,
            captured_at: Utc::now(),
        }
    }

    /// Capture the tracked fields of a product record
    ///
    /// Returns `None` for records without tracked fields.
    pub fn capture(record: &Record) -> Option<Self> {
        record
            .tracked_fields()
            .map(|fields| Self::new(record.id, fields))
    }

    /// Check if the snapshot is older than the given age
    pub fn is_expired(&self, ttl: chrono::Duration) -> bool {
        Utc::now().signed_duration_since(self.captured_at) >= ttl
    }
}

/// Trait for snapshot store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// ## Implementation Guidelines
///
/// - **Expired means absent**: `get` must never return a snapshot past its TTL
/// - **Overwrite on put**: a new snapshot replaces any unconsumed one
/// - **No background tasks**: eviction happens on read or via `purge_expired`
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store a snapshot, replacing any previous one for the same record
    async fn put(&self, snapshot: Snapshot) -> Result<(), crate::Error>;

    /// Get the live snapshot for a record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Snapshot))`: A snapshot younger than the TTL
    /// - `Ok(None)`: Never captured, already removed, or expired
    /// - `Err(Error)`: Storage error
    async fn get(&self, record_id: RecordId) -> Result<Option<Snapshot>, crate::Error>;

    /// Remove a record's snapshot and its pending marker
    ///
    /// Removing an absent snapshot is not an error.
    async fn remove(&self, record_id: RecordId) -> Result<(), crate::Error>;

    /// Set or clear the "pending send" marker of a record
    async fn set_pending(&self, record_id: RecordId, pending: bool) -> Result<(), crate::Error>;

    /// Whether a record has a delta waiting for a successful send
    async fn is_pending(&self, record_id: RecordId) -> Result<bool, crate::Error>;

    /// Drop every expired snapshot and its pending marker, returning how many
    /// snapshots were removed
    async fn purge_expired(&self) -> Result<usize, crate::Error>;
}
