//! Error types for the connector
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the connector
#[derive(Error, Debug)]
pub enum Error {
    /// The settings store was never initialized or cannot be read
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// Outbound credentials are incomplete; no request was attempted
    #[error("Credentials missing: {0}")]
    CredentialsMissing(String),

    /// Network or HTTP failure on an outbound call
    #[error("Transport error: {0}")]
    Transport(String),

    /// Inbound authentication failure
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failure while decoding or dispatching an inbound payload
    #[error("Dispatch failure: {0}")]
    Dispatch(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot store errors
    #[error("Snapshot store error: {0}")]
    SnapshotStore(String),

    /// Settings store errors
    #[error("Settings store error: {0}")]
    SettingsStore(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "configuration unavailable" error
    pub fn config_unavailable(msg: impl Into<String>) -> Self {
        Self::ConfigUnavailable(msg.into())
    }

    /// Create a "credentials missing" error
    pub fn credentials_missing(msg: impl Into<String>) -> Self {
        Self::CredentialsMissing(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a snapshot store error
    pub fn snapshot_store(msg: impl Into<String>) -> Self {
        Self::SnapshotStore(msg.into())
    }

    /// Create a settings store error
    pub fn settings_store(msg: impl Into<String>) -> Self {
        Self::SettingsStore(msg.into())
    }

    /// Whether the error means outbound sync can never succeed with the
    /// current configuration (as opposed to a transient network failure)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigUnavailable(_) | Self::CredentialsMissing(_) | Self::Config(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(Error::credentials_missing("password").is_configuration());
        assert!(Error::config_unavailable("never saved").is_configuration());
        assert!(!Error::transport("connection refused").is_configuration());
    }

    #[test]
    fn test_display_carries_message() {
        let err = Error::transport("timed out after 180s");
        assert_eq!(err.to_string(), "Transport error: timed out after 180s");
    }
}
