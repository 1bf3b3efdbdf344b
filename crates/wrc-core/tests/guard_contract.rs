//! Contract Test: Hook Guards and Routing
//!
//! Constraints verified:
//! - Autosaves and revisions never capture or send
//! - A pipeline that is not in send mode never captures or sends
//! - A receive-mode deployment never makes an outbound call

mod common;

use common::*;
use wrc_core::config::SyncMode;
use wrc_core::engine::{HookOutcome, SkipReason, SyncEngine};
use wrc_core::record::{RecordId, SaveContext};
use wrc_core::router::{HostEnvironment, ModeRouter, PipelineRole};
use wrc_core::state::MemorySnapshotStore;
use wrc_core::traits::SnapshotStore;

#[tokio::test]
async fn autosave_pre_update_writes_no_snapshot() {
    let store = MemorySnapshotStore::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(store.clone()),
        Box::new(RecordingTransport::new()),
    );

    let autosave = SaveContext {
        autosave: true,
        revision: false,
    };
    let outcome = engine.on_pre_update(&autosave, &product(9, "A1", "Old")).await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::Autosave));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn revision_save_sends_nothing() {
    let transport = RecordingTransport::new();
    let (engine, _events) = SyncEngine::new(
        &send_config(),
        sender_routing(),
        Box::new(MemorySnapshotStore::new()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let revision = SaveContext {
        autosave: false,
        revision: true,
    };
    engine.on_pre_update(&SaveContext::user_save(), &product(9, "A1", "Old")).await;
    let outcome = engine.on_post_save(&revision, &product(9, "A1", "New")).await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::Revision));
    assert_eq!(transport.send_call_count(), 0);
}

#[tokio::test]
async fn products_inactive_without_catalog() {
    let transport = RecordingTransport::new();
    let store = MemorySnapshotStore::new();
    let routing = ModeRouter::route(&send_config(), &HostEnvironment::default());
    assert_eq!(routing.posts, PipelineRole::Sender);

    let (engine, _events) = SyncEngine::new(
        &send_config(),
        routing,
        Box::new(store.clone()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    assert_eq!(
        engine.on_pre_update(&ctx, &product(9, "A1", "Old")).await,
        HookOutcome::Skipped(SkipReason::PipelineInactive)
    );
    assert_eq!(
        engine.on_post_save(&ctx, &product(9, "A1", "New")).await,
        HookOutcome::Skipped(SkipReason::PipelineInactive)
    );
    assert!(store.get(RecordId(9)).await.unwrap().is_none());
    assert_eq!(transport.send_call_count(), 0);
}

#[tokio::test]
async fn receive_mode_never_sends() {
    let mut config = send_config();
    config.mode = SyncMode::Receive;
    config.inbound_username = "receiver".to_string();
    config.inbound_password = "pw".to_string();

    let transport = RecordingTransport::new();
    let routing = ModeRouter::route(&config, &HostEnvironment::with_product_catalog());
    let (engine, _events) = SyncEngine::new(
        &config,
        routing,
        Box::new(MemorySnapshotStore::new()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let ctx = SaveContext::user_save();
    engine.on_pre_update(&ctx, &product(9, "A1", "Old")).await;
    engine.on_post_save(&ctx, &product(9, "A1", "New")).await;
    engine
        .on_post_save(&ctx, &wrc_core::Record::post(3, "Hello"))
        .await;

    assert_eq!(transport.send_call_count(), 0);
}

#[tokio::test]
async fn missing_password_disables_outbound_pipelines() {
    let mut config = send_config();
    config.api_password.clear();

    let transport = RecordingTransport::new();
    let routing = ModeRouter::route(&config, &HostEnvironment::with_product_catalog());
    let (engine, _events) = SyncEngine::new(
        &config,
        routing,
        Box::new(MemorySnapshotStore::new()),
        Box::new(RecordingTransport::sharing_counters_with(&transport)),
    );

    let outcome = engine
        .on_post_save(&SaveContext::user_save(), &wrc_core::Record::post(3, "Hello"))
        .await;

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::PipelineInactive));
    assert_eq!(transport.send_call_count(), 0);
}
