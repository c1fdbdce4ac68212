//! On-disk cache store: one JSON file per key
//!
//! Writes go to a temp file in the cache directory and are renamed over the
//! entry, so readers see either the previous entry or the new one. Writers are
//! serialized per key; readers take no lock.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use super::{CacheEntry, CacheStore, Clock, system_clock};
use crate::dataset::Dataset;
use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

const ENTRY_EXTENSION: &str = "json";

/// File-backed cache store
pub struct FileCacheStore {
    dir: PathBuf,
    clock: Clock,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileCacheStore {
    /// Get the cache directory path (~/.cache/hnmon on Linux)
    pub fn default_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("hnmon"))
    }

    /// Open the store at a specific directory
    pub fn open_at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            clock: system_clock(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// File holding the entry for `key`
    pub fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(CacheError::Io(format!("Invalid cache key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION)))
    }

    fn key_lock(&self, key: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| CacheError::Io("Cache lock table poisoned".to_string()))?;
        Ok(locks.entry(key.to_string()).or_default().clone())
    }

    fn is_entry_file(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn peek(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        CacheEntry::from_slice(&bytes).map(Some)
    }

    async fn put(&self, key: &str, dataset: &Dataset, ttl: Duration) -> Result<()> {
        let path = self.entry_path(key)?;
        let lock = self.key_lock(key)?;
        let _guard = lock.lock().await;

        let entry = CacheEntry::new(dataset.clone(), self.now(), ttl);
        let bytes = entry.to_vec()?;
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let io = |e: std::io::Error| CacheError::Io(format!("Failed to write cache entry: {}", e));
            let mut tmp = NamedTempFile::new_in(&dir).map_err(io)?;
            tmp.write_all(&bytes).map_err(io)?;
            tmp.as_file().sync_all().map_err(io)?;
            tmp.persist(&path).map_err(|e| io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Io(format!("Cache writer task failed: {}", e)))??;

        log::debug!("Cached {} rows under {}", dataset.row_count, key);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        let lock = self.key_lock(key)?;
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::Io(format!("Failed to list cache dir: {}", e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?
        {
            let path = entry.path();
            if !Self::is_entry_file(&path) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::ManualClock;
    use tempfile::TempDir;

    fn test_store() -> (FileCacheStore, ManualClock, TempDir) {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new();
        let store = FileCacheStore::open_at(dir.path())
            .unwrap()
            .with_clock(clock.clock());
        (store, clock, dir)
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (store, _clock, dir) = test_store();
        store.put("abc", &Dataset::sample(3), Duration::from_secs(300)).await.unwrap();

        let entry = store.get("abc").await.unwrap().unwrap();
        assert_eq!(entry.dataset.row_count, 3);
        assert_eq!(entry.ttl_seconds, 300);
        assert_eq!(file_names(dir.path()), vec!["abc.json"]);
    }

    #[tokio::test]
    async fn test_ttl_boundary_on_disk() {
        let (store, clock, _dir) = test_store();
        store.put("k", &Dataset::sample(1), Duration::from_secs(300)).await.unwrap();

        clock.advance(299);
        assert!(store.get("k").await.unwrap().is_some());
        clock.advance(1);
        assert!(store.get("k").await.unwrap().is_none());
        clock.advance(1);
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let (store, _clock, _dir) = test_store();
        assert!(store.get("nothing").await.unwrap().is_none());
        assert!(store.invalidate("nothing").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_forces_miss() {
        let (store, _clock, _dir) = test_store();
        store.put("k", &Dataset::sample(2), Duration::from_secs(300)).await.unwrap();
        store.invalidate("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_updates_written_at() {
        let (store, clock, _dir) = test_store();
        store.put("k", &Dataset::sample(1), Duration::from_secs(300)).await.unwrap();
        let first = store.peek("k").await.unwrap().unwrap().written_at;

        clock.advance(10);
        store.put("k", &Dataset::sample(5), Duration::from_secs(300)).await.unwrap();
        let second = store.peek("k").await.unwrap().unwrap();

        assert!(second.written_at > first);
        assert_eq!(second.dataset.row_count, 5);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_reported() {
        let (store, _clock, dir) = test_store();
        std::fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();

        let err = store.get("bad").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupted(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let (store, _clock, _dir) = test_store();
        assert!(store.peek("../escape").await.is_err());
        assert!(store.peek("").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_counts_entries_only() {
        let (store, _clock, dir) = test_store();
        store.put("a", &Dataset::sample(1), Duration::from_secs(300)).await.unwrap();
        store.put("b", &Dataset::sample(1), Duration::from_secs(300)).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(file_names(dir.path()), vec!["notes.txt"]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_no_temp_files() {
        let (store, _clock, dir) = test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .put("shared", &Dataset::sample(i + 1), Duration::from_secs(300))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(file_names(dir.path()), vec!["shared.json"]);
        let entry = store.get("shared").await.unwrap().unwrap();
        assert!(entry.dataset.is_consistent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_torn_writes() {
        let (store, _clock, _dir) = test_store();
        let store = Arc::new(store);
        store.put("k", &Dataset::sample(1), Duration::from_secs(300)).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..40 {
                    let rows = if i % 2 == 0 { 500 } else { 3 };
                    store
                        .put("k", &Dataset::sample(rows), Duration::from_secs(300))
                        .await
                        .unwrap();
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let entry = store.peek("k").await.unwrap().unwrap();
                    assert_eq!(entry.dataset.row_count, entry.dataset.rows.len());
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
