// # Memory Settings Store
//
// In-memory implementation of SettingsStore for tests and embedding hosts
// that already hold their options in memory.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::Error;
use crate::traits::SettingsStore;

/// In-memory settings store
///
/// `None` models a host whose option was never saved.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: Option<HashMap<String, String>>,
}

impl MemorySettingsStore {
    /// Create an initialized store with the given settings
    pub fn new(settings: HashMap<String, String>) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    /// Create a store that reports `ConfigUnavailable`
    pub fn uninitialized() -> Self {
        Self { settings: None }
    }

    /// Create an initialized store from key/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_all(&self) -> Result<HashMap<String, String>, Error> {
        self.settings
            .clone()
            .ok_or_else(|| Error::config_unavailable("settings have never been saved"))
    }
}
