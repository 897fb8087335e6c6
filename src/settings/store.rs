//! Persistent backing store for the base settings frame.
//!
//! [`TomlSettingsStore`] writes `settings.toml`; [`MemoryStore`] keeps
//! everything in process and is used by tests and dry runs.

use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::Mutex;

use super::value::SettingsMap;

// ---------------------------------------------------------------------------
// SettingsStore trait
// ---------------------------------------------------------------------------

/// Where committed settings live between runs.
///
/// Implementations must be `Send + Sync` so the stack holding them can be
/// shared across threads.
pub trait SettingsStore: Send + Sync {
    /// Read the persisted settings; an empty map when nothing is stored yet.
    fn load(&self) -> Result<SettingsMap>;

    /// Replace the persisted settings with `values`.
    fn commit(&self, values: &SettingsMap) -> Result<()>;
}

// ---------------------------------------------------------------------------
// TomlSettingsStore
// ---------------------------------------------------------------------------

/// Stores the flat settings map as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<SettingsMap> {
        if !self.path.exists() {
            return Ok(SettingsMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let values: SettingsMap = toml::from_str(&content)?;
        Ok(values)
    }

    fn commit(&self, values: &SettingsMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        log::debug!("wrote {} setting(s) to {}", values.len(), self.path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store; counts commits so callers can observe flushes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<SettingsMap>,
    commits: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(values: SettingsMap) -> Self {
        Self {
            values: Mutex::new(values),
            commits: Mutex::new(0),
        }
    }

    pub fn values(&self) -> SettingsMap {
        self.values.lock().clone()
    }

    pub fn commit_count(&self) -> usize {
        *self.commits.lock()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<SettingsMap> {
        Ok(self.values())
    }

    fn commit(&self, values: &SettingsMap) -> Result<()> {
        *self.values.lock() = values.clone();
        *self.commits.lock() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingValue;
    use tempfile::tempdir;

    #[test]
    fn toml_store_missing_file_loads_empty() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn toml_store_round_trip_with_dotted_keys() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path().join("nested/settings.toml"));

        let mut values = SettingsMap::new();
        values.insert("engine".into(), "espeak".into());
        values.insert("espeak.player".into(), "mpv".into());
        values.insert("espeak.cache_speech".into(), true.into());
        values.insert("espeak.speed".into(), SettingValue::Int(200));

        store.commit(&values).expect("commit");
        assert_eq!(store.load().expect("load"), values);
    }

    #[test]
    fn toml_store_rejects_garbage() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "engine = [").expect("write");
        assert!(TomlSettingsStore::new(path).load().is_err());
    }

    #[test]
    fn memory_store_counts_commits() {
        let store = MemoryStore::default();
        let mut values = SettingsMap::new();
        values.insert("engine".into(), "piper".into());

        store.commit(&values).expect("commit");
        store.commit(&values).expect("commit");

        assert_eq!(store.commit_count(), 2);
        assert_eq!(store.load().expect("load"), values);
    }
}
