//! Player preferences
//!
//! Only the two volume levels persist between sessions. They live in a
//! key/value `PreferenceStore`: LocalStorage on the web, a small JSON file
//! on native, an in-memory map in tests.

#[cfg(not(target_arch = "wasm32"))]
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_VOLUME, EFFECTS_VOLUME_KEY, MUSIC_VOLUME_KEY};
use crate::error::{GameError, Result};

/// Float key/value persistence
pub trait PreferenceStore: Debug {
    fn get_f32(&self, key: &str) -> Option<f32>;
    fn set_f32(&mut self, key: &str, value: f32) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, f32>,
}

impl PreferenceStore for MemoryStore {
    fn get_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set_f32(&mut self, key: &str, value: f32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Preferences kept in a JSON object on disk (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
    values: BTreeMap<String, f32>,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    /// Open the store, starting empty if the file is missing or unreadable
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(values) => {
                    log::info!("Loaded preferences from {}", path.display());
                    values
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt preferences file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for JsonFileStore {
    fn get_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set_f32(&mut self, key: &str, value: f32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| GameError::Preferences(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| GameError::Preferences(e.to_string()))
    }
}

/// Browser LocalStorage, one item per key
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct LocalStorageStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, preferences will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl PreferenceStore for LocalStorageStore {
    fn get_f32(&self, key: &str) -> Option<f32> {
        let item = self.storage.as_ref()?.get_item(key).ok().flatten()?;
        item.parse().ok()
    }

    fn set_f32(&mut self, key: &str, value: f32) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Err(GameError::Preferences("LocalStorage unavailable".into()));
        };
        storage
            .set_item(key, &value.to_string())
            .map_err(|e| GameError::Preferences(format!("{:?}", e)))
    }
}

/// Persisted volume levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub effects_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: DEFAULT_VOLUME,
            effects_volume: DEFAULT_VOLUME,
        }
    }
}

impl Settings {
    /// Read both volumes, defaulting missing keys and clamping stored values
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let read = |key: &str| {
            store
                .get_f32(key)
                .filter(|v: &f32| v.is_finite())
                .map_or(DEFAULT_VOLUME, |v| v.clamp(0.0, 1.0))
        };
        Self {
            music_volume: read(MUSIC_VOLUME_KEY),
            effects_volume: read(EFFECTS_VOLUME_KEY),
        }
    }

    pub fn save(&self, store: &mut dyn PreferenceStore) -> Result<()> {
        store.set_f32(MUSIC_VOLUME_KEY, self.music_volume)?;
        store.set_f32(EFFECTS_VOLUME_KEY, self.effects_volume)
    }
}
