use anyhow::Result;
use movielist_models::ViewPreferences;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Key the list view preferences are stored under.
pub const VIEW_PREFERENCES_KEY: &str = "listViewPreferences";

/// Small persistent key/value store for client-side UI state.
///
/// Backed by a single JSON object on disk. A corrupt file or a corrupt
/// value is treated as missing so callers fall back to defaults.
pub struct PreferenceStore {
    path: PathBuf,
    entries: BTreeMap<String, serde_json::Value>,
}

impl PreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: BTreeMap::new(),
        }
    }

    /// Open and load the store at `path`.
    pub fn open(path: PathBuf) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn load(&mut self) {
        if !self.path.exists() {
            debug!("Preference store miss: {:?} does not exist", self.path);
            self.entries.clear();
            return;
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&content) {
                Ok(entries) => {
                    debug!("Loaded {} preference entries from {:?}", entries.len(), self.path);
                    self.entries = entries;
                }
                Err(e) => {
                    warn!("Preference store corruption detected in {:?}: {}. Using defaults.", self.path, e);
                    self.entries.clear();
                }
            },
            Err(e) => {
                warn!("Failed to read preference store {:?}: {}", self.path, e);
                self.entries.clear();
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Ignoring corrupt preference value for '{}': {}", key, e);
                None
            }
        }
    }

    /// Store `value` under `key` and write the store to disk.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    pub fn load_view_preferences(&self) -> ViewPreferences {
        self.get(VIEW_PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn save_view_preferences(&mut self, preferences: &ViewPreferences) -> Result<()> {
        self.set(VIEW_PREFERENCES_KEY, preferences)
    }
}
