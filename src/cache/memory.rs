//! In-process cache store

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CacheEntry, CacheStore, Clock, system_clock};
use crate::dataset::Dataset;
use crate::error::CacheError;

/// Cache store that lives only as long as the process.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Clock,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn peek(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, dataset: &Dataset, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(dataset.clone(), self.now(), ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}
