// # Sync Transport Trait
//
// Defines the interface for delivering payloads to the remote receiver.
//
// ## Implementations
//
// - HTTP (reqwest): `wrc-transport-http` crate
//
// ## Usage
//
// ```rust,ignore
// use wrc_core::SyncTransport;
//
// let response = transport
//     .send("/wrc/v1/receive-product-data", &serde_json::json!({"sku": "A1"}))
//     .await?;
// ```

use async_trait::async_trait;

/// Inbound path for post payloads
pub const POST_ENDPOINT: &str = "/wrc/v1/receive-post-data";

/// Inbound path for product deltas
pub const PRODUCT_ENDPOINT: &str = "/wrc/v1/receive-product-data";

/// Response of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// Trait for transport implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP/HTTPS call to the configured receiver per `send`
/// - ✅ Map transport failures and non-2xx responses to errors
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the pipeline has no retry policy)
/// - ❌ Touch the snapshot store (owned by `SyncEngine`)
/// - ❌ Decide whether a payload is worth sending (owned by `SyncEngine`)
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// POST a JSON payload to `endpoint` on the remote site
    ///
    /// # Returns
    ///
    /// - `Ok(TransportResponse)`: The receiver answered with 2xx
    /// - `Err(Error::CredentialsMissing)`: Refused before any network I/O
    /// - `Err(Error::Transport)`: Network failure or non-2xx response
    async fn send(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<TransportResponse, crate::Error>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}

/// Join a base URL and an endpoint path
///
/// Trailing slashes are stripped from the base and the endpoint gets exactly
/// one leading slash.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_normalization() {
        let expected = "https://shop.example.nl/wp-json/wrc/v1/receive-post-data";
        assert_eq!(
            endpoint_url("https://shop.example.nl/wp-json", "/wrc/v1/receive-post-data"),
            expected
        );
        assert_eq!(
            endpoint_url("https://shop.example.nl/wp-json//", "wrc/v1/receive-post-data"),
            expected
        );
        assert_eq!(
            endpoint_url("https://shop.example.nl/wp-json/", "//wrc/v1/receive-post-data"),
            expected
        );
    }
}
