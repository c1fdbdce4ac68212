//! Cache key generation using SHA-256 hashes

use sha2::{Digest, Sha256};

/// Logical name of the aggregated monitors dataset
pub const MONITORS_DATASET: &str = "monitors";

/// Generate a deterministic cache key from a dataset name and its scope.
///
/// The scope carries whatever makes two datasets differ (API host, client ID,
/// suit limit). Parameter order does not affect the key.
pub fn cache_key(dataset: &str, scope: &[(&str, &str)]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(dataset.as_bytes());
    hasher.update(b"|");

    // Sort for deterministic key
    let mut sorted_scope: Vec<_> = scope.iter().collect();
    sorted_scope.sort_by_key(|(k, _)| *k);

    for (k, v) in sorted_scope {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{:x}", hasher.finalize())
}
