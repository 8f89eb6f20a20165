//! Durable client-side preferences: the unit system and the last submitted
//! city.
//!
//! Every failure here is swallowed by [`Preferences`]; the orchestrator falls
//! back to in-memory defaults and keeps going.

use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{StorageError, config::project_dirs, model::UnitSystem};

pub const UNITS_KEY: &str = "units";
pub const LAST_CITY_KEY: &str = "lastCity";

/// Scoped key/value persistence.
pub trait Storage: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// TOML table of string values in a single file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `state.toml` in the platform data directory.
    pub fn default_location() -> Result<Self, StorageError> {
        let dirs = project_dirs().ok_or(StorageError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join("state.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(&all)?)?;
        Ok(())
    }
}

/// Process-lifetime storage; what remains when nothing durable is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed, failure-swallowing view over a [`Storage`].
#[derive(Debug, Clone)]
pub struct Preferences {
    storage: Arc<dyn Storage>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persisted units; unknown or unreadable values count as absent.
    pub fn units(&self) -> Option<UnitSystem> {
        let raw = self.read(UNITS_KEY)?;
        match UnitSystem::try_from(raw.as_str()) {
            Ok(units) => Some(units),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring persisted unit preference");
                None
            }
        }
    }

    pub fn last_city(&self) -> Option<String> {
        self.read(LAST_CITY_KEY)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    pub fn save_units(&self, units: UnitSystem) {
        self.write(UNITS_KEY, units.as_str());
    }

    pub fn save_last_city(&self, city: &str) {
        self.write(LAST_CITY_KEY, city);
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Preference storage unavailable, using defaults");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to persist preference");
        }
    }
}
