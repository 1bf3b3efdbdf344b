// # File Settings Store
//
// JSON-file implementation of SettingsStore, standing in for the host's
// persistent option table.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good settings
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "settings": {
//     "wrc_api_url": "https://shop.example.nl/wp-json",
//     "wrc_api_username": "sync",
//     "wrc_api_password": "...",
//     "wrc_mode": "send"
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::SettingsStore;

/// Settings file format version
const SETTINGS_FILE_VERSION: &str = "1.0";

/// Serializable settings file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SettingsFileFormat {
    version: String,
    settings: HashMap<String, String>,
}

/// File-backed settings store
///
/// A missing file means the settings were never initialized: reads fail with
/// `ConfigUnavailable` until something calls [`FileSettingsStore::set`] and
/// [`FileSettingsStore::save`].
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    settings: Arc<RwLock<Option<HashMap<String, String>>>>,
}

impl FileSettingsStore {
    /// Open a settings file, recovering from the backup if it is corrupted
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let settings = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            settings: Arc::new(RwLock::new(settings)),
        })
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set a value in memory; call [`save`](Self::save) to persist it
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut guard = self.settings.write().await;
        guard
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    /// Write the current settings to disk atomically
    pub async fn save(&self) -> Result<(), Error> {
        let snapshot = self.settings.read().await.clone().unwrap_or_default();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::settings_store(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(&SettingsFileFormat {
            version: SETTINGS_FILE_VERSION.to_string(),
            settings: snapshot,
        })
        .map_err(|e| Error::settings_store(format!("Failed to serialize settings: {}", e)))?;

        let temp_path = Self::sibling(&self.path, "tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::settings_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists() {
            let backup_path = Self::sibling(&self.path, "backup");
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create settings backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::settings_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Settings written to {}", self.path.display());
        Ok(())
    }

    async fn load_with_recovery(path: &Path) -> Result<Option<HashMap<String, String>>, Error> {
        match Self::load(path).await {
            Ok(settings) => Ok(settings),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Settings file {} appears corrupted: {}. Attempting recovery from backup.",
                    path.display(),
                    e
                );

                let backup_path = Self::sibling(path, "backup");
                match Self::load(&backup_path).await {
                    Ok(Some(settings)) => {
                        tracing::info!("Recovered {} settings from backup", settings.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore settings file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(Some(settings))
                    }
                    Ok(None) => {
                        tracing::warn!("No settings backup found. Treating settings as unset.");
                        Ok(None)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Settings backup also unreadable: {}. Treating settings as unset.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<Option<HashMap<String, String>>, Error> {
        if !path.exists() {
            tracing::debug!("Settings file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::settings_store(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: SettingsFileFormat = serde_json::from_str(&content)?;

        if file.version != SETTINGS_FILE_VERSION {
            tracing::warn!(
                "Settings file version mismatch: expected {}, got {}. Attempting to load anyway.",
                SETTINGS_FILE_VERSION,
                file.version
            );
        }

        Ok(Some(file.settings))
    }

    fn sibling(path: &Path, extension: &str) -> PathBuf {
        let mut sibling = path.to_path_buf();
        sibling.set_extension(extension);
        sibling
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get_all(&self) -> Result<HashMap<String, String>, Error> {
        self.settings.read().await.clone().ok_or_else(|| {
            Error::config_unavailable(format!(
                "settings file {} has not been initialized",
                self.path.display()
            ))
        })
    }
}
