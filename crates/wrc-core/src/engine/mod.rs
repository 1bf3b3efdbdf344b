//! Core sync engine
//!
//! The SyncEngine is the host adapter's entry point. It is responsible for:
//! - Capturing pre-update snapshots of product records
//! - Computing deltas on post-save and suppressing empty ones
//! - Pushing post payloads and product deltas through the SyncTransport
//! - Cleaning up snapshots after a successful push
//!
//! ## Architecture
//!
//! ```text
//! host pre-update ──► on_pre_update ──► SnapshotStore (put)
//!
//! host post-save ───► on_post_save
//!                        │
//!                        ├─ post ────► full payload ─────────┐
//!                        │                                   ▼
//!                        └─ product ─► SnapshotStore (get)   SyncTransport
//!                                      compute_delta ───────►   │
//!                                                               ▼
//!                                      SnapshotStore (remove on success)
//! ```
//!
//! ## Failure Policy
//!
//! Hooks never return `Err`. Every outcome, including transport failures, is
//! folded into a [`HookOutcome`] so nothing escapes into the host's save.
//! There is no retry: a failed push leaves the snapshot in place and is
//! dropped.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::delta::compute_delta;
use crate::record::{Record, RecordId, SaveContext};
use crate::router::Routing;
use crate::traits::{Snapshot, SnapshotStore, SyncTransport, POST_ENDPOINT, PRODUCT_ENDPOINT};

/// Default capacity of the monitoring channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Why a hook did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The host was autosaving
    Autosave,
    /// The saved record is a historical revision
    Revision,
    /// The pipeline for this record type is not in send mode
    PipelineInactive,
    /// The record does not belong to the pipeline
    WrongRecordType,
    /// No live snapshot for the record
    NoSnapshot,
    /// No tracked field changed
    NoChanges,
}

/// Result of a hook call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// A snapshot was stored
    Captured,
    /// A payload was delivered
    Sent {
        /// Remote path the payload went to
        endpoint: &'static str,
        /// HTTP status of the response
        status: u16,
    },
    /// Nothing to do
    Skipped(SkipReason),
    /// Delivery failed; logged and dropped
    Failed(String),
    /// Internal failure that should not happen (store errors, serialization)
    Fatal(String),
}

impl HookOutcome {
    /// Whether the hook delivered a payload
    pub fn is_sent(&self) -> bool {
        matches!(self, HookOutcome::Sent { .. })
    }
}

/// Events emitted by the SyncEngine for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Pre-update snapshot stored
    SnapshotCaptured { record_id: RecordId },

    /// Hook decided there was nothing to send
    SyncSkipped {
        record_id: RecordId,
        reason: SkipReason,
    },

    /// Payload delivered
    SyncSent {
        record_id: RecordId,
        endpoint: &'static str,
        status: u16,
    },

    /// Payload delivery failed
    SyncFailed {
        record_id: RecordId,
        endpoint: &'static str,
        error: String,
    },
}

/// Core sync engine
///
/// Built once per process from an explicit configuration and routing; holds
/// no global state. Each hook call runs to completion on the caller's task,
/// including the outbound request, so a slow receiver slows the save that
/// triggered it.
pub struct SyncEngine {
    /// Pipeline roles decided at startup
    routing: Routing,

    /// Language attached to product deltas
    language: String,

    /// Pre-update snapshots
    snapshots: Box<dyn SnapshotStore>,

    /// Outbound delivery
    transport: Box<dyn SyncTransport>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        config: &SyncConfig,
        routing: Routing,
        snapshots: Box<dyn SnapshotStore>,
        transport: Box<dyn SyncTransport>,
    ) -> (Self, mpsc::Receiver<SyncEvent>) {
        Self::with_event_capacity(
            config,
            routing,
            snapshots,
            transport,
            DEFAULT_EVENT_CHANNEL_CAPACITY,
        )
    }

    /// Create a new engine with a custom monitoring channel capacity
    pub fn with_event_capacity(
        config: &SyncConfig,
        routing: Routing,
        snapshots: Box<dyn SnapshotStore>,
        transport: Box<dyn SyncTransport>,
        event_channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(event_channel_capacity.max(1));

        let engine = Self {
            routing,
            language: config.language.clone(),
            snapshots,
            transport,
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Pipeline roles this engine was built with
    pub fn routing(&self) -> Routing {
        self.routing
    }

    /// Pre-update hook: capture the current state of a product record
    pub async fn on_pre_update(&self, ctx: &SaveContext, record: &Record) -> HookOutcome {
        if let Some(reason) = Self::guard(ctx) {
            return self.skip(record.id, reason);
        }
        if !self.routing.products.is_sender() {
            return self.skip(record.id, SkipReason::PipelineInactive);
        }

        let Some(snapshot) = Snapshot::capture(record) else {
            return self.skip(record.id, SkipReason::WrongRecordType);
        };

        match self.snapshots.put(snapshot).await {
            Ok(()) => {
                info!("Captured pre-update snapshot for record {}", record.id);
                self.emit_event(SyncEvent::SnapshotCaptured {
                    record_id: record.id,
                });
                HookOutcome::Captured
            }
            Err(e) => {
                error!("Failed to store snapshot for record {}: {}", record.id, e);
                HookOutcome::Fatal(e.to_string())
            }
        }
    }

    /// Post-save hook: push the post, or the product delta
    pub async fn on_post_save(&self, ctx: &SaveContext, record: &Record) -> HookOutcome {
        if let Some(reason) = Self::guard(ctx) {
            return self.skip(record.id, reason);
        }

        if record.is_product() {
            self.sync_product(record).await
        } else {
            self.sync_post(record).await
        }
    }

    /// Drop expired snapshots
    pub async fn purge_expired_snapshots(&self) -> usize {
        match self.snapshots.purge_expired().await {
            Ok(purged) => {
                if purged > 0 {
                    debug!("Purged {} expired snapshot(s)", purged);
                }
                purged
            }
            Err(e) => {
                warn!("Failed to purge expired snapshots: {}", e);
                0
            }
        }
    }

    async fn sync_post(&self, record: &Record) -> HookOutcome {
        if !self.routing.posts.is_sender() {
            return self.skip(record.id, SkipReason::PipelineInactive);
        }

        let payload = match serde_json::to_value(record.post_payload()) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize post {}: {}", record.id, e);
                return HookOutcome::Fatal(e.to_string());
            }
        };

        self.deliver(record.id, POST_ENDPOINT, &payload).await
    }

    async fn sync_product(&self, record: &Record) -> HookOutcome {
        if !self.routing.products.is_sender() {
            return self.skip(record.id, SkipReason::PipelineInactive);
        }
        if record.tracked_fields().is_none() {
            return self.skip(record.id, SkipReason::WrongRecordType);
        }

        let snapshot = match self.snapshots.get(record.id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return self.skip(record.id, SkipReason::NoSnapshot),
            Err(e) => {
                error!("Failed to read snapshot for record {}: {}", record.id, e);
                return HookOutcome::Fatal(e.to_string());
            }
        };

        let Some(delta) = compute_delta(&snapshot, record, &self.language) else {
            return self.skip(record.id, SkipReason::NoChanges);
        };

        debug!(
            "Record {} changed fields: {}",
            record.id,
            delta.changed_fields().join(", ")
        );

        if let Err(e) = self.snapshots.set_pending(record.id, true).await {
            warn!("Failed to mark record {} as pending: {}", record.id, e);
        }

        let outcome = self
            .deliver(record.id, PRODUCT_ENDPOINT, &delta.to_payload())
            .await;

        // Snapshot and marker stay in place unless the push succeeded
        if outcome.is_sent()
            && let Err(e) = self.snapshots.remove(record.id).await
        {
            warn!("Failed to clear snapshot for record {}: {}", record.id, e);
        }

        outcome
    }

    async fn deliver(
        &self,
        record_id: RecordId,
        endpoint: &'static str,
        payload: &serde_json::Value,
    ) -> HookOutcome {
        match self.transport.send(endpoint, payload).await {
            Ok(response) => {
                info!(
                    "Synced record {} to {} via {} (status {})",
                    record_id,
                    endpoint,
                    self.transport.transport_name(),
                    response.status
                );
                self.emit_event(SyncEvent::SyncSent {
                    record_id,
                    endpoint,
                    status: response.status,
                });
                HookOutcome::Sent {
                    endpoint,
                    status: response.status,
                }
            }
            Err(e) => {
                error!("Failed to sync record {} to {}: {}", record_id, endpoint, e);
                self.emit_event(SyncEvent::SyncFailed {
                    record_id,
                    endpoint,
                    error: e.to_string(),
                });
                HookOutcome::Failed(e.to_string())
            }
        }
    }

    fn guard(ctx: &SaveContext) -> Option<SkipReason> {
        if ctx.autosave {
            Some(SkipReason::Autosave)
        } else if ctx.revision {
            Some(SkipReason::Revision)
        } else {
            None
        }
    }

    fn skip(&self, record_id: RecordId, reason: SkipReason) -> HookOutcome {
        debug!("Skipping record {}: {:?}", record_id, reason);
        self.emit_event(SyncEvent::SyncSkipped { record_id, reason });
        HookOutcome::Skipped(reason)
    }

    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            // Nobody is draining events fast enough
            Err(TrySendError::Full(_)) => warn!("Event channel full, dropping event"),
            // The embedder is not monitoring
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_order() {
        let both = SaveContext {
            autosave: true,
            revision: true,
        };
        assert_eq!(SyncEngine::guard(&both), Some(SkipReason::Autosave));
        assert_eq!(SyncEngine::guard(&SaveContext::user_save()), None);
    }

    struct Accepting;

    #[async_trait::async_trait]
    impl SyncTransport for Accepting {
        async fn send(
            &self,
            _endpoint: &str,
            _payload: &serde_json::Value,
        ) -> crate::Result<crate::traits::TransportResponse> {
            Ok(crate::traits::TransportResponse {
                status: 200,
                body: String::new(),
            })
        }

        fn transport_name(&self) -> &'static str {
            "accepting"
        }
    }

    fn sender_engine(capacity: usize) -> (SyncEngine, mpsc::Receiver<SyncEvent>) {
        use crate::router::PipelineRole;

        let routing = Routing {
            posts: PipelineRole::Sender,
            products: PipelineRole::Sender,
        };
        SyncEngine::with_event_capacity(
            &SyncConfig::new(),
            routing,
            Box::new(crate::state::MemorySnapshotStore::new()),
            Box::new(Accepting),
            capacity,
        )
    }

    #[tokio::test]
    async fn test_closed_event_channel_does_not_affect_hooks() {
        let (engine, events) = sender_engine(4);
        drop(events);

        let outcome = engine
            .on_post_save(&SaveContext::user_save(), &Record::post(1, "Hello"))
            .await;
        assert!(outcome.is_sent());
    }

    #[tokio::test]
    async fn test_full_event_channel_drops_newest() {
        let (engine, mut events) = sender_engine(1);
        let ctx = SaveContext::user_save();

        engine.on_post_save(&ctx, &Record::post(1, "First")).await;
        engine.on_post_save(&ctx, &Record::post(2, "Second")).await;

        assert!(matches!(
            events.try_recv(),
            Ok(SyncEvent::SyncSent { record_id: RecordId(1), .. })
        ));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_outcome_is_sent() {
        assert!(HookOutcome::Sent {
            endpoint: POST_ENDPOINT,
            status: 200
        }
        .is_sent());
        assert!(!HookOutcome::Skipped(SkipReason::NoChanges).is_sent());
    }
}
