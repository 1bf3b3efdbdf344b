//! Core traits for the connector
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`SettingsStore`]: Read persisted connector settings
//! - [`SnapshotStore`]: Short-lived pre-update snapshots keyed by record id
//! - [`SyncTransport`]: Deliver payloads to the remote receiver

pub mod settings_store;
pub mod snapshot_store;
pub mod transport;

pub use settings_store::SettingsStore;
pub use snapshot_store::{Snapshot, SnapshotStore, SNAPSHOT_TTL_SECS};
pub use transport::{
    endpoint_url, SyncTransport, TransportResponse, POST_ENDPOINT, PRODUCT_ENDPOINT,
};
