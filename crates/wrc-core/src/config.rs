//! Configuration types for the connector
//!
//! [`SyncConfig`] is built once at startup from a [`SettingsStore`] and then
//! passed by reference to every component that needs it.
//!
//! [`SettingsStore`]: crate::traits::SettingsStore

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Remote base URL of the receiving site
pub const KEY_API_URL: &str = "wrc_api_url";
/// Username sent with outbound calls
pub const KEY_API_USERNAME: &str = "wrc_api_username";
/// Password sent with outbound calls
pub const KEY_API_PASSWORD: &str = "wrc_api_password";
/// Operating mode (`send` or `receive`)
pub const KEY_MODE: &str = "wrc_mode";
/// Username the receiver accepts
pub const KEY_INBOUND_USERNAME: &str = "wrc_inbound_username";
/// Password the receiver accepts
pub const KEY_INBOUND_PASSWORD: &str = "wrc_inbound_password";
/// Language code attached to product deltas
pub const KEY_LANGUAGE: &str = "wrc_language";
/// Outbound request timeout in seconds
pub const KEY_TIMEOUT_SECS: &str = "wrc_timeout_secs";
/// Skip TLS verification on outbound calls (local development only)
pub const KEY_LOCAL_DEV: &str = "wrc_local_dev";

/// Language attached to product deltas when none is configured
pub const DEFAULT_LANGUAGE: &str = "nl";

/// Lower bound for the outbound timeout
///
/// Content sync runs behind a save operation, not in front of a user, so
/// shorter timeouts are raised to this value.
pub const MIN_TIMEOUT_SECS: u64 = 180;

/// Operating mode of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Push local changes to the remote receiver
    Send,
    /// Accept pushes from a remote sender
    #[default]
    Receive,
}

impl SyncMode {
    /// Parse a mode setting; unknown values are rejected
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "send" => Ok(SyncMode::Send),
            "receive" => Ok(SyncMode::Receive),
            other => Err(Error::config(format!(
                "Unknown {} '{}'. Valid modes: send, receive",
                KEY_MODE, other
            ))),
        }
    }

    /// Mode name as stored in settings
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Send => "send",
            SyncMode::Receive => "receive",
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete outbound credentials
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundCredentials {
    /// Base URL of the receiving site
    pub api_url: String,
    /// Basic-auth username
    pub username: String,
    /// Basic-auth password
    pub password: String,
}

impl std::fmt::Debug for OutboundCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundCredentials")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Credentials the receiver checks on every inbound request
#[derive(Clone, PartialEq, Eq)]
pub struct InboundCredentials {
    /// Expected Basic-auth username
    pub username: String,
    /// Expected Basic-auth password
    pub password: String,
}

impl InboundCredentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check a supplied pair against the expected one
    ///
    /// Both halves are always compared, in time independent of where the
    /// inputs first differ.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl std::fmt::Debug for InboundCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Connector configuration
///
/// Empty strings mean "not set". Outbound sync requires URL, username and
/// password; anything less disables it.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the remote receiver
    pub api_url: String,
    /// Outbound Basic-auth username
    pub api_username: String,
    /// Outbound Basic-auth password
    pub api_password: String,
    /// Operating mode
    pub mode: SyncMode,
    /// Receiver-side username
    pub inbound_username: String,
    /// Receiver-side password
    pub inbound_password: String,
    /// Language code attached to product deltas
    pub language: String,
    /// Outbound request timeout in seconds (never below [`MIN_TIMEOUT_SECS`])
    pub timeout_secs: u64,
    /// Skip TLS verification on outbound calls
    pub local_dev: bool,
}

impl SyncConfig {
    /// Create an empty receive-mode configuration
    pub fn new() -> Self {
        Self {
            api_url: String::new(),
            api_username: String::new(),
            api_password: String::new(),
            mode: SyncMode::default(),
            inbound_username: String::new(),
            inbound_password: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: MIN_TIMEOUT_SECS,
            local_dev: false,
        }
    }

    /// Build a configuration from raw settings
    ///
    /// Missing keys fall back to defaults. Malformed values for keys that
    /// have a fixed vocabulary (mode, timeout) are configuration errors.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            settings
                .get(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let mode = match settings.get(KEY_MODE) {
            Some(value) if !value.trim().is_empty() => SyncMode::parse(value)?,
            _ => SyncMode::default(),
        };

        let timeout_secs = match settings.get(KEY_TIMEOUT_SECS) {
            Some(value) if !value.trim().is_empty() => {
                let secs: u64 = value.trim().parse().map_err(|_| {
                    Error::config(format!(
                        "{} must be a whole number of seconds. Got: {}",
                        KEY_TIMEOUT_SECS, value
                    ))
                })?;
                secs.max(MIN_TIMEOUT_SECS)
            }
            _ => MIN_TIMEOUT_SECS,
        };

        let language = match get(KEY_LANGUAGE) {
            lang if lang.is_empty() => DEFAULT_LANGUAGE.to_string(),
            lang => lang,
        };

        Ok(Self {
            api_url: get(KEY_API_URL),
            api_username: get(KEY_API_USERNAME),
            api_password: get(KEY_API_PASSWORD),
            mode,
            inbound_username: get(KEY_INBOUND_USERNAME),
            inbound_password: get(KEY_INBOUND_PASSWORD),
            language,
            timeout_secs,
            local_dev: parse_flag(&get(KEY_LOCAL_DEV)),
        })
    }

    /// Outbound credentials, or `CredentialsMissing` naming the absent fields
    pub fn outbound_credentials(&self) -> Result<OutboundCredentials> {
        let missing: Vec<&str> = [
            (KEY_API_URL, &self.api_url),
            (KEY_API_USERNAME, &self.api_username),
            (KEY_API_PASSWORD, &self.api_password),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect();

        if !missing.is_empty() {
            return Err(Error::credentials_missing(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        Ok(OutboundCredentials {
            api_url: self.api_url.clone(),
            username: self.api_username.clone(),
            password: self.api_password.clone(),
        })
    }

    /// Inbound credentials, or `Config` if either half is unset
    pub fn inbound_credentials(&self) -> Result<InboundCredentials> {
        if self.inbound_username.is_empty() || self.inbound_password.is_empty() {
            return Err(Error::config(format!(
                "{} and {} are required in receive mode",
                KEY_INBOUND_USERNAME, KEY_INBOUND_PASSWORD
            )));
        }
        Ok(InboundCredentials::new(
            self.inbound_username.clone(),
            self.inbound_password.clone(),
        ))
    }

    /// Outbound request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(MIN_TIMEOUT_SECS))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Passwords never reach logs
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_url", &self.api_url)
            .field("api_username", &self.api_username)
            .field("api_password", &"<REDACTED>")
            .field("mode", &self.mode)
            .field("inbound_username", &self.inbound_username)
            .field("inbound_password", &"<REDACTED>")
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .field("local_dev", &self.local_dev)
            .finish()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
