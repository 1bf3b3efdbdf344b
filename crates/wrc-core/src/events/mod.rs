//! Extensibility events for received payloads
//!
//! The receiver decodes a payload and hands it to the [`EventHub`]; what
//! happens next (persisting the post, updating the product) belongs to the
//! subscribers. The hub does no deduplication: the same payload dispatched
//! twice reaches every subscriber twice.
//!
//! ## Registration
//!
//! ```rust,ignore
//! use wrc_core::events::{EventHub, ReceiveEvent};
//!
//! let hub = EventHub::new();
//! hub.subscribe(ReceiveEvent::ProductData, Arc::new(ProductWriter::new(db)));
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::{Error, Result};

/// Named dispatch points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiveEvent {
    /// A post payload arrived on `/wrc/v1/receive-post-data`
    PostData,
    /// A product delta arrived on `/wrc/v1/receive-product-data`
    ProductData,
}

impl ReceiveEvent {
    /// Event name as exposed to subscribers
    pub fn name(&self) -> &'static str {
        match self {
            ReceiveEvent::PostData => "on_receive_post_data",
            ReceiveEvent::ProductData => "on_receive_product_data",
        }
    }
}

impl std::fmt::Display for ReceiveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Request details passed along with a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Path the payload arrived on
    pub path: String,
    /// Authenticated Basic-auth username
    pub username: String,
    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Arrival time
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a request that just arrived
    pub fn new(path: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            username: username.into(),
            content_type: None,
            received_at: Utc::now(),
        }
    }

    /// Attach the content type
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }
}

/// Downstream consumer of received payloads
#[async_trait]
pub trait ReceiveSubscriber: Send + Sync {
    /// Handle one payload
    ///
    /// An error aborts the dispatch and is reported to the caller as a
    /// processing failure.
    async fn handle(
        &self,
        event: ReceiveEvent,
        data: &serde_json::Value,
        request: &RequestContext,
    ) -> Result<()>;
}

/// Registry of subscribers per event
#[derive(Default)]
pub struct EventHub {
    subscribers: RwLock<HashMap<ReceiveEvent, Vec<Arc<dyn ReceiveSubscriber>>>>,
}

impl EventHub {
    /// Create a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; subscribers run in registration order
    pub fn subscribe(&self, event: ReceiveEvent, subscriber: Arc<dyn ReceiveSubscriber>) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.entry(event).or_default().push(subscriber);
    }

    /// Number of subscribers for an event
    pub fn subscriber_count(&self, event: ReceiveEvent) -> usize {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.get(&event).map_or(0, Vec::len)
    }

    /// Deliver a payload to every subscriber of `event`
    ///
    /// Stops at the first failing subscriber and returns `Error::Dispatch`
    /// naming the event. Returns the number of subscribers that ran.
    pub async fn dispatch(
        &self,
        event: ReceiveEvent,
        data: &serde_json::Value,
        request: &RequestContext,
    ) -> Result<usize> {
        // Release the lock before awaiting subscribers
        let targets: Vec<Arc<dyn ReceiveSubscriber>> = {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subscribers.get(&event).cloned().unwrap_or_default()
        };

        debug!("Dispatching {} to {} subscriber(s)", event, targets.len());

        for subscriber in &targets {
            subscriber
                .handle(event, data, request)
                .await
                .map_err(|e| Error::dispatch(format!("{} subscriber failed: {}", event, e)))?;
        }

        Ok(targets.len())
    }
}
