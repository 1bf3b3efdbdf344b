// # wrc-core
//
// Core library for the one-way content sync connector.
//
// ## Architecture Overview
//
// This library provides the core functionality for pushing content changes
// from a sending site to a receiving site:
// - **SettingsStore**: Trait for reading the connector's persisted settings
// - **SnapshotStore**: Trait for short-lived pre-update snapshots
// - **SyncTransport**: Trait for authenticated outbound delivery
// - **ModeRouter**: Decides once at startup which pipelines send or receive
// - **SyncEngine**: Hooks that turn host saves into outbound payloads
// - **EventHub**: Subscriber registry for payloads arriving at the receiver
//
// ## Design Principles
//
// 1. **Host-Agnostic**: The host is reached only through small adapter traits
// 2. **Delta-Only Products**: Product saves send changed fields, never the full record
// 3. **Explicit Configuration**: Built from a SyncConfig, no process-global state
// 4. **Library-First**: The daemon is a thin shell over this crate

pub mod auth;
pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod events;
pub mod record;
pub mod router;
pub mod settings;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use traits::{SettingsStore, SnapshotStore, SyncTransport};
pub use engine::{HookOutcome, SkipReason, SyncEngine, SyncEvent};
pub use events::{EventHub, ReceiveEvent, ReceiveSubscriber, RequestContext};
pub use router::{HostEnvironment, ModeRouter, PipelineRole, Routing};
pub use config::{InboundCredentials, OutboundCredentials, SyncConfig, SyncMode};
pub use record::{ProductFields, Record, RecordId, SaveContext};
pub use delta::{compute_delta, Delta};
pub use error::{Error, Result};
pub use state::MemorySnapshotStore;
pub use settings::{FileSettingsStore, MemorySettingsStore};
