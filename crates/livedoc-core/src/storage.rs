//! Persistent key-value storage — the local-storage analogue.
//!
//! Sessions persist to `{data_dir}/session.json` as a flat JSON string map.
//! The trait boundary is infallible: IO or parse failures degrade to absent
//! values and are logged, mirroring how a browser treats corrupt storage.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::StorageConfig;

const SESSION_FILENAME: &str = "session.json";

/// Key-value store for session state. Implementations must never panic or
/// error at this boundary; a broken backing file reads as empty.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// JSON-file-backed store rooted at the configured data dir.
///
/// Mutations take an interior lock around the whole load/save pair, so
/// concurrent writers through one shared store never lose updates.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self::at_path(cfg.dir.join(SESSION_FILENAME))
    }

    /// Store at an explicit path (tests, embedding hosts).
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HashMap<String, String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("session store corrupt, treating as empty: {e}");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn save(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!("session store mkdir failed: {e}");
                    return;
                }
            }
        }
        match serde_json::to_string_pretty(map) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.path, content) {
                    tracing::warn!("session store write failed: {e}");
                }
            }
            Err(e) => tracing::warn!("session store serialize failed: {e}"),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap();
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.load();
        map.insert(key.to_string(), value.to_string());
        self.save(&map);
    }

    fn remove(&self, key: &str) {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.save(&map);
        }
    }
}

/// In-memory store for tests and ephemeral embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at_path(dir.path().join("session.json"));
        assert_eq!(store.get("token"), None);
        store.set("token", "abc");
        assert_eq!(store.get("token").as_deref(), Some("abc"));
        store.remove("token");
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn file_store_survives_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::at_path(path);
        assert_eq!(store.get("anything"), None);
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_store_concurrent_writers_lose_nothing() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSessionStore::at_path(dir.path().join("session.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.set(&format!("key-{i}"), &format!("value-{i}"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Every read-modify-write must have landed.
        for i in 0..8 {
            assert_eq!(
                store.get(&format!("key-{i}")).as_deref(),
                Some(format!("value-{i}").as_str())
            );
        }
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }
}
