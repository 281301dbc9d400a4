use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key holding the undo action log.
pub const UNDO_ACTIONS_KEY: &str = "undoActions";
/// Key holding the profile's bookmark tree.
pub const BOOKMARK_TREE_KEY: &str = "bookmarkTree";
/// Key holding a node snapshot staged for cross-profile sync.
pub const SYNC_PAYLOAD_KEY: &str = "tempBookmarkObject";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed value under {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store refused to write {0}")]
    Rejected(String),
}

/// Async key-value persistence. Values are JSON.
///
/// Calls against the same key are not coordinated: callers must await one
/// write before issuing the next.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn has(&self, key: &str) -> Result<bool, StoreError>;
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>;
    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

fn to_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })
}

fn from_json<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// JSON files on disk
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn io_err(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl Store for FileStore {
    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| Self::io_err(key, e))
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let raw = match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_err(key, e)),
        };
        from_json(key, &raw).map(Some)
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let contents = to_json(key, value)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_err(key, e))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| Self::io_err(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Self::io_err(key, e))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    reject_writes: Arc<AtomicBool>,
    rejected_keys: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail.
    #[cfg(test)]
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make subsequent saves of `key` fail while other keys still work.
    #[cfg(test)]
    pub fn reject_key(&self, key: &str) {
        self.rejected_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
    }

    fn rejects(&self, key: &str) -> bool {
        self.reject_writes.load(Ordering::SeqCst)
            || self
                .rejected_keys
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains(key)
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent JSON strings.
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.values().contains_key(key))
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let raw = self.values().get(key).cloned();
        raw.map(|raw| from_json(key, &raw)).transpose()
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        if self.rejects(key) {
            return Err(StoreError::Rejected(key.to_string()));
        }
        let contents = to_json(key, value)?;
        self.values().insert(key.to_string(), contents);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.has("k").await.unwrap());
        store.save("k", &vec![1, 2, 3]).await.unwrap();
        assert!(store.has("k").await.unwrap());
        let v: Option<Vec<i32>> = store.get("k").await.unwrap();
        assert_eq!(v, Some(vec![1, 2, 3]));
        store.remove("k").await.unwrap();
        let v: Option<Vec<i32>> = store.get("k").await.unwrap();
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn memory_store_clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.save("shared", "hello").await.unwrap();
        let v: Option<String> = b.get("shared").await.unwrap();
        assert_eq!(v.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn memory_store_rejects_writes_on_request() {
        let store = MemoryStore::new();
        store.set_reject_writes(true);
        let err = store.save("k", &1).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(ref k) if k == "k"));
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn memory_store_rejects_single_key() {
        let store = MemoryStore::new();
        store.reject_key(BOOKMARK_TREE_KEY);
        assert!(store.save(BOOKMARK_TREE_KEY, &1).await.is_err());
        store.save(UNDO_ACTIONS_KEY, &1).await.unwrap();
        assert!(store.has(UNDO_ACTIONS_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn memory_store_reports_bad_json_type() {
        let store = MemoryStore::new();
        store.save("k", "text").await.unwrap();
        let err = store.get::<Vec<u32>>("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("tilemark-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir);

        let missing: Option<String> = store.get(UNDO_ACTIONS_KEY).await.unwrap();
        assert!(missing.is_none());

        store.save(UNDO_ACTIONS_KEY, &vec!["a", "b"]).await.unwrap();
        assert!(store.has(UNDO_ACTIONS_KEY).await.unwrap());
        assert!(dir.join("undoActions.json").is_file());
        assert!(!dir.join("undoActions.json.tmp").exists());

        let v: Option<Vec<String>> = store.get(UNDO_ACTIONS_KEY).await.unwrap();
        assert_eq!(v, Some(vec!["a".to_string(), "b".to_string()]));

        store.remove(UNDO_ACTIONS_KEY).await.unwrap();
        store.remove(UNDO_ACTIONS_KEY).await.unwrap();
        assert!(!store.has(UNDO_ACTIONS_KEY).await.unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
