//! Contract Test: Product Delta Sync
//!
//! Constraints verified:
//! - A product save sends only the changed tracked fields plus language and sku
//! - A save with no tracked changes makes no outbound call
//! - A save with no live snapshot makes no outbound call
//! - A successful send consumes the snapshot
//! - A failed send leaves the snapshot and pending marker in place

mod common;

use common::*;
use wrc_core::engine::{HookOutcome, SkipReason, SyncEngine, SyncEvent};
use wrc_core::record::{RecordId, SaveContext};
use wrc_core::state::MemorySnapshotStore;
use wrc_core::traits::{Snapshot, SnapshotStore, PRODUCT_ENDPOINT};

#[tokio::test]
async fn changed_title_sends_minimal_delta() {
    let transport = RecordingTransport::new();
    let store = MemorySnapshotStore::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    let before = product(9, "A1", "Old");
    assert_eq!(engine.on_pre_update(&ctx, &before).await, HookOutcome::Captured);

    let after = product(9, "A1", "New");
    let outcome = engine.on_post_save(&ctx, &after).await;

    assert_eq!(
        outcome,
        HookOutcome::Sent {
            endpoint: PRODUCT_ENDPOINT,
            status: 200
        }
    );
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, PRODUCT_ENDPOINT);
    assert_eq!(
        sent[0].1,
        serde_json::json!({"post_title": "New", "language": "nl", "sku": "A1"})
    );

    // Snapshot consumed, nothing pending
    assert!(store.get(RecordId(9)).await.unwrap().is_none());
    assert!(!store.is_pending(RecordId(9)).await.unwrap());
}

#[tokio::test]
async fn unchanged_save_makes_no_call() {
    let transport = RecordingTransport::new();
    let store = MemorySnapshotStore::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    let record = product(9, "A1", "X");
    engine.on_pre_update(&ctx, &record).await;

    let outcome = engine.on_post_save(&ctx, &record).await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::NoChanges));
    assert_eq!(transport.send_call_count(), 0);
    // Snapshot stays until it expires or a later save consumes it
    assert!(store.get(RecordId(9)).await.unwrap().is_some());
}

#[tokio::test]
async fn partial_snapshot_compares_only_captured_fields() {
    let transport = RecordingTransport::new();
    let store = MemorySnapshotStore::new();
    store
        .put(Snapshot::new(
            RecordId(9),
            [("sku", "A1"), ("post_title", "Old")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
        .await
        .unwrap();

    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let outcome = engine
        .on_post_save(&SaveContext::user_save(), &product(9, "A1", "New"))
        .await;

    assert!(outcome.is_sent());
    assert_eq!(
        transport.sent()[0].1,
        serde_json::json!({"post_title": "New", "language": "nl", "sku": "A1"})
    );
}

#[tokio::test]
async fn missing_snapshot_makes_no_call() {
    let transport = RecordingTransport::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(MemorySnapshotStore::new()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let outcome = engine
        .on_post_save(&SaveContext::user_save(), &product(9, "A1", "New"))
        .await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::NoSnapshot));
    assert_eq!(transport.send_call_count(), 0);
}

#[tokio::test]
async fn expired_snapshot_makes_no_call() {
    let transport = RecordingTransport::new();
    let store = MemorySnapshotStore::with_ttl(chrono::Duration::zero());
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    engine.on_pre_update(&ctx, &product(9, "A1", "Old")).await;
    let outcome = engine.on_post_save(&ctx, &product(9, "A1", "New")).await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::NoSnapshot));
    assert_eq!(transport.send_call_count(), 0);
}

#[tokio::test]
async fn failed_send_keeps_snapshot_and_pending_marker() {
    let transport = FailingTransport::new();
    let store = MemorySnapshotStore::new();
    let (engine, mut events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(FailingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    engine.on_pre_update(&ctx, &product(9, "A1", "Old")).await;
    let outcome = engine.on_post_save(&ctx, &product(9, "A1", "New")).await;

    assert!(matches!(outcome, HookOutcome::Failed(_)));
    assert_eq!(transport.send_call_count(), 1);
    assert!(store.get(RecordId(9)).await.unwrap().is_some());
    assert!(store.is_pending(RecordId(9)).await.unwrap());

    // Captured, then failed
    assert!(matches!(
        events.try_recv(),
        Ok(SyncEvent::SnapshotCaptured { .. })
    ));
    assert!(matches!(
        events.try_recv(),
        Ok(SyncEvent::SyncFailed {
            endpoint: PRODUCT_ENDPOINT,
            ..
        })
    ));
}

#[tokio::test]
async fn second_save_after_failure_diffs_against_kept_snapshot() {
    // No automatic retry, but the next save still diffs against the kept snapshot
    let store = MemorySnapshotStore::new();
    let ctx = SaveContext::user_save();

    {
        let (engine, _events) = SyncEngine::new(
            &send_config(),
            sender_routing(),
            Box::new(store.clone()),
            Box::new(FailingTransport::new()),
        );
        engine.on_pre_update(&ctx, &product(9, "A1", "Old")).await;
        engine.on_post_save(&ctx, &product(9, "A1", "New")).await;
    }

    let transport = RecordingTransport::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let outcome = engine.on_post_save(&ctx, &product(9, "A1", "New")).await;

    assert!(outcome.is_sent());
    assert_eq!(transport.sent()[0].1["post_title"], "New");
    assert!(!store.is_pending(RecordId(9)).await.unwrap());
}
