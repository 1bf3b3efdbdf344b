// # wrc-receiver
//
// Inbound side of the connector: two authenticated POST routes that decode a
// payload and hand it to the EventHub.
//
// ## Routes
//
// - `GET  /health`                      unauthenticated liveness probe
// - `POST /wrc/v1/receive-post-data`    mounted when posts are in receive mode
// - `POST /wrc/v1/receive-product-data` mounted when products are in receive mode
//
// ## Responses
//
// - 200 with a JSON string on success
// - 401 with a `rest_forbidden` body when Basic credentials are missing or wrong
// - 500 with a JSON string when the body is not JSON or a subscriber fails
//
// Nothing is deduplicated: the same body posted twice is dispatched twice.

pub mod api;
pub mod subscriber;

use std::sync::Arc;
use wrc_core::config::InboundCredentials;
use wrc_core::events::EventHub;
use wrc_core::router::Routing;

pub use api::{permission_check, router};
pub use subscriber::LoggingSubscriber;

/// Shared state of the inbound router
#[derive(Clone)]
pub struct ReceiverState {
    /// Credentials every inbound request must present
    pub credentials: InboundCredentials,
    /// Where decoded payloads go
    pub hub: Arc<EventHub>,
    /// Which routes are mounted
    pub routing: Routing,
}

impl ReceiverState {
    pub fn new(credentials: InboundCredentials, hub: Arc<EventHub>, routing: Routing) -> Self {
        Self {
            credentials,
            hub,
            routing,
        }
    }
}

impl std::fmt::Debug for ReceiverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverState")
            .field("credentials", &self.credentials)
            .field("routing", &self.routing)
            .finish_non_exhaustive()
    }
}
