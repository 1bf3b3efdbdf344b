//! Built-in subscriber that records receipts in the log

use async_trait::async_trait;
use tracing::info;
use wrc_core::events::{ReceiveEvent, ReceiveSubscriber, RequestContext};
use wrc_core::record::IDENTIFIER_FIELD;
use wrc_core::Result;

/// Logs every received payload
///
/// Useful as the first subscriber of a deployment so receipts show up even
/// before a persisting subscriber is wired in. Logs field names only, never
/// field values.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSubscriber;

#[async_trait]
impl ReceiveSubscriber for LoggingSubscriber {
    async fn handle(
        &self,
        event: ReceiveEvent,
        data: &serde_json::Value,
        request: &RequestContext,
    ) -> Result<()> {
        let fields: Vec<&str> = data
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default();

        match event {
            ReceiveEvent::ProductData => info!(
                user = %request.username,
                sku = data.get(IDENTIFIER_FIELD).and_then(|v| v.as_str()).unwrap_or(""),
                "Received product delta with fields [{}]",
                fields.join(", ")
            ),
            ReceiveEvent::PostData => info!(
                user = %request.username,
                id = %data.get("id").cloned().unwrap_or_default(),
                "Received post with fields [{}]",
                fields.join(", ")
            ),
        }

        Ok(())
    }
}
