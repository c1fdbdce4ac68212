//! Persisted cache entry

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::CacheError;

/// A dataset plus the metadata needed to decide whether it may be served.
///
/// Serialized flat: `{ writtenAt, ttlSeconds, rowCount, fetchedAt, ..., rows }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub written_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    #[serde(flatten)]
    pub dataset: Dataset,
}

impl CacheEntry {
    pub fn new(dataset: Dataset, written_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            written_at,
            ttl_seconds: ttl.as_secs(),
            dataset,
        }
    }

    /// Valid iff `now - written_at < ttl`. An entry exactly at its TTL is expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));
        now.signed_duration_since(self.written_at) < ttl
    }

    /// Age at `now`. Clock skew that puts `written_at` in the future reads as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Reject entries whose row count disagrees with their rows.
    pub fn verify(self) -> Result<Self, CacheError> {
        if self.dataset.is_consistent() {
            Ok(self)
        } else {
            Err(CacheError::Corrupted(format!(
                "rowCount {} does not match {} rows",
                self.dataset.row_count,
                self.dataset.rows.len()
            )))
        }
    }

    /// Decode and verify a serialized entry.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CacheError> {
        let entry: CacheEntry =
            serde_json::from_slice(bytes).map_err(|e| CacheError::Corrupted(e.to_string()))?;
        entry.verify()
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(self).map_err(|e| CacheError::Serialize(e.to_string()))
    }
}
