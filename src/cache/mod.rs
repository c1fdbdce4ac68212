//! Local cache for aggregated datasets
//!
//! A [`CacheStore`] maps a dataset key to its last aggregate plus the time it
//! was written. Entries past their TTL are never served. [`FileCacheStore`]
//! persists one JSON file per key; [`MemoryCacheStore`] backs `--no-cache`
//! runs and tests.

pub mod entry;
pub mod file;
pub mod key;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::CacheError;

pub use entry::CacheEntry;
pub use file::FileCacheStore;
pub use key::{MONITORS_DATASET, cache_key};
pub use memory::MemoryCacheStore;

/// Time source for TTL checks. Injected so tests can move time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Summary of one key's cache state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub valid: bool,
    /// Age of the stored entry, valid or not
    #[serde(skip_serializing_if = "Option::is_none", with = "duration_secs")]
    pub age: Option<Duration>,
    pub row_count: Option<usize>,
    pub written_at: Option<DateTime<Utc>>,
    pub ttl_seconds: Option<u64>,
    pub partial: bool,
}

impl CacheStatus {
    /// Status of a key with no stored entry
    pub fn missing() -> Self {
        Self {
            valid: false,
            age: None,
            row_count: None,
            written_at: None,
            ttl_seconds: None,
            partial: false,
        }
    }

    fn of(entry: &CacheEntry, now: DateTime<Utc>) -> Self {
        Self {
            valid: entry.is_valid_at(now),
            age: Some(entry.age_at(now)),
            row_count: Some(entry.dataset.row_count),
            written_at: Some(entry.written_at),
            ttl_seconds: Some(entry.ttl_seconds),
            partial: entry.dataset.partial,
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_secs()),
            None => s.serialize_none(),
        }
    }
}

/// Keyed, TTL-bound dataset store.
///
/// Implementations must allow concurrent readers and serialize writers per key.
/// A reader never observes a half-written entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored entry regardless of TTL. Unreadable entries yield `Corrupted`.
    async fn peek(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Persist `dataset` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, dataset: &Dataset, ttl: Duration) -> Result<(), CacheError>;

    /// Remove the entry so the next `get` misses.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> Result<usize, CacheError>;

    /// Current time according to the store's clock
    fn now(&self) -> DateTime<Utc>;

    /// Entry for `key` only if it exists and is still within its TTL.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = self.now();
        Ok(self.peek(key).await?.filter(|entry| entry.is_valid_at(now)))
    }

    async fn status(&self, key: &str) -> Result<CacheStatus, CacheError> {
        let now = self.now();
        Ok(match self.peek(key).await? {
            Some(entry) => CacheStatus::of(&entry, now),
            None => CacheStatus::missing(),
        })
    }
}
