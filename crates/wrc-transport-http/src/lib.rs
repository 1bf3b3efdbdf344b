// # HTTP Sync Transport
//
// This crate delivers sync payloads to the remote receiver over HTTP(S).
//
// ## Behavior
//
// - ✅ One POST per `send`, JSON body, HTTP Basic auth
// - ✅ Credentials checked before any network I/O
// - ✅ Non-2xx responses mapped to `Error::Transport` with the status
// - ✅ Generous timeout (at least 180 seconds)
// - ❌ NO retry logic (a failed push is logged and dropped by SyncEngine)
// - ❌ NO snapshot access (owned by SyncEngine)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - TLS verification is only disabled when `wrc_local_dev` is set
//
// ## Wire Format
//
// ```http
// POST {api_url}/wrc/v1/receive-product-data
// Authorization: Basic base64(username:password)
// Content-Type: application/json
//
// {"post_title":"New","language":"nl","sku":"A1"}
// ```

use async_trait::async_trait;
use std::time::Duration;
use wrc_core::auth::basic_auth_header;
use wrc_core::config::{OutboundCredentials, SyncConfig};
use wrc_core::traits::{endpoint_url, SyncTransport, TransportResponse};
use wrc_core::{Error, Result};

/// HTTP transport to the remote receiver
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Whether a payload is worth sending, and what
/// happens after a failure, is decided by `SyncEngine`.
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct HttpTransport {
    /// Complete credentials, or `None` when the configuration lacks any of
    /// URL, username or password
    credentials: Option<OutboundCredentials>,

    /// HTTP client for outbound requests
    client: reqwest::Client,

    /// Request timeout the client was built with
    timeout: Duration,

    /// TLS verification disabled
    insecure: bool,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field(
                "api_url",
                &self.credentials.as_ref().map(|c| c.api_url.as_str()),
            )
            .field(
                "username",
                &self.credentials.as_ref().map(|c| c.username.as_str()),
            )
            .field("password", &"<REDACTED>")
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport from the connector configuration
    ///
    /// Incomplete credentials do not fail construction; every `send` then
    /// fails with `CredentialsMissing` without touching the network.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let credentials = match config.outbound_credentials() {
            Ok(creds) => Some(creds),
            Err(e) => {
                tracing::warn!("HTTP transport created without usable credentials: {}", e);
                None
            }
        };

        let timeout = config.timeout();
        if config.local_dev {
            tracing::warn!("Local development mode: TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.local_dev)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            client,
            timeout,
            insecure: config.local_dev,
        })
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether TLS verification is disabled
    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    fn credentials(&self) -> Result<&OutboundCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            Error::credentials_missing("API URL, username and password must all be configured")
        })
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    /// POST a payload to the receiver
    ///
    /// # API Call
    ///
    /// ```http
    /// POST {api_url}{endpoint}
    /// Authorization: Basic <credentials>
    /// Content-Type: application/json
    /// ```
    async fn send(&self, endpoint: &str, payload: &serde_json::Value) -> Result<TransportResponse> {
        let creds = self.credentials()?;
        let url = endpoint_url(&creds.api_url, endpoint);

        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                basic_auth_header(&creds.username, &creds.password),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !status.is_success() {
            // Map HTTP status codes to specific errors
            return match status.as_u16() {
                401 | 403 => Err(Error::transport(format!(
                    "Authentication rejected by receiver. Status: {}",
                    status
                ))),
                404 => Err(Error::transport(format!(
                    "Receiver route not found: {} (is the receiver in receive mode?)",
                    url
                ))),
                500..=599 => Err(Error::transport(format!(
                    "Receiver error: {} - {}",
                    status, body
                ))),
                _ => Err(Error::transport(format!(
                    "Unexpected response: {} - {}",
                    status, body
                ))),
            };
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrc_core::config::{SyncMode, MIN_TIMEOUT_SECS};

    fn config() -> SyncConfig {
        let mut config = SyncConfig::new();
        config.mode = SyncMode::Send;
        config.api_url = "https://receiver.example.nl".to_string();
        config.api_username = "sync".to_string();
        config.api_password = "super-secret-password".to_string();
        config
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let transport = HttpTransport::from_config(&config()).unwrap();
        let debug = format!("{:?}", transport);

        assert!(!debug.contains("super-secret-password"));
        assert!(debug.contains("<REDACTED>"));
        assert!(debug.contains("receiver.example.nl"));
    }

    #[test]
    fn test_timeout_never_below_minimum() {
        let mut config = config();
        config.timeout_secs = 5;
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(MIN_TIMEOUT_SECS));
    }

    #[test]
    fn test_local_dev_disables_verification() {
        let mut config = config();
        assert!(!HttpTransport::from_config(&config).unwrap().is_insecure());
        config.local_dev = true;
        assert!(HttpTransport::from_config(&config).unwrap().is_insecure());
    }

    #[tokio::test]
    async fn test_incomplete_credentials_refuse_to_send() {
        let mut config = config();
        config.api_username.clear();
        let transport = HttpTransport::from_config(&config).unwrap();

        let err = transport
            .send("/wrc/v1/receive-post-data", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialsMissing(_)));
    }

    #[test]
    fn test_transport_name() {
        let transport = HttpTransport::from_config(&config()).unwrap();
        assert_eq!(transport.transport_name(), "http");
    }
}
