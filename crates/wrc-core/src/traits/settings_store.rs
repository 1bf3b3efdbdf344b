// # Settings Store Trait
//
// Read-only view of the host's persisted key-value options.
//
// ## Implementations
//
// - `MemorySettingsStore`: in-process map (tests, embedding)
// - `FileSettingsStore`: JSON option file with backup recovery

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::{SyncConfig, SyncMode, KEY_MODE};

/// Trait for settings store implementations
///
/// Implementations must be thread-safe. Nothing in the connector writes
/// through this trait.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Return every persisted setting
    ///
    /// # Returns
    ///
    /// - `Ok(map)`: The settings (possibly empty)
    /// - `Err(Error::ConfigUnavailable)`: The store was never initialized
    async fn get_all(&self) -> Result<HashMap<String, String>, crate::Error>;

    /// Return the configured mode, `Receive` when unset
    async fn get_mode(&self) -> Result<SyncMode, crate::Error> {
        let settings = self.get_all().await?;
        match settings.get(KEY_MODE) {
            Some(value) if !value.trim().is_empty() => SyncMode::parse(value),
            _ => Ok(SyncMode::Receive),
        }
    }

    /// Build the connector configuration from the stored settings
    async fn load_config(&self) -> Result<SyncConfig, crate::Error> {
        let settings = self.get_all().await?;
        SyncConfig::from_settings(&settings)
    }
}
