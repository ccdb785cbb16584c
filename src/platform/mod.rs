//! Platform abstraction layer
//!
//! The one seam between the game and the host: string key-value storage.
//! High scores, settings, the lifetime profile, and save games all go
//! through [`KvStore`], so everything above this module stays testable
//! with an in-memory store.

use std::collections::HashMap;
use std::path::PathBuf;

/// String key-value storage. Failures are reported, never propagated:
/// a broken disk must not take the game loop down with it.
pub trait KvStore {
    /// Fetch a previously stored value, if any
    fn get(&self, key: &str) -> Option<String>;
    /// Store a value; returns false when the write did not stick
    fn set(&mut self, key: &str, value: &str) -> bool;
    /// Drop a key entirely; absent keys are not an error
    fn remove(&mut self, key: &str);
}

/// File-backed store: one file per key under a dot-directory in `$HOME`
/// (falling back to the working directory when `$HOME` is unset).
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `~/.horde-holdout/`
    pub fn new() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            root: PathBuf::from(home).join(".horde-holdout"),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if let Err(err) = std::fs::create_dir_all(&self.root) {
            log::warn!("storage dir unavailable: {err}");
            return false;
        }
        match std::fs::write(self.path_for(key), value) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to write {key}: {err}");
                false
            }
        }
    }

    fn remove(&mut self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    values: HashMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.values.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_store_round_trip() {
        let mut store = MemStore::new();
        assert_eq!(store.get("scores"), None);
        assert!(store.set("scores", "[]"));
        assert_eq!(store.get("scores").as_deref(), Some("[]"));
        assert!(store.set("scores", "[1]"));
        assert_eq!(store.get("scores").as_deref(), Some("[1]"));

        store.remove("scores");
        assert_eq!(store.get("scores"), None);
        store.remove("scores");
    }

    #[test]
    fn test_file_store_key_paths_stay_inside_root() {
        let store = FileStore::new();
        let path = store.path_for("settings");
        assert!(path.ends_with(".horde-holdout/settings.json"));
    }
}
