//! Cache status display model

use serde::Serialize;
use tabled::Tabled;

use crate::cache::CacheStatus;
use crate::output::formatters::{format_age, format_timestamp_local};

/// One cached dataset's state
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct CacheStatusDisplay {
    #[tabled(rename = "DATASET")]
    pub dataset: String,

    /// valid, expired or missing
    #[tabled(rename = "STATE")]
    pub state: String,

    #[tabled(rename = "ROWS")]
    pub rows: String,

    #[tabled(rename = "AGE")]
    pub age: String,

    #[tabled(rename = "TTL")]
    pub ttl: String,

    #[tabled(rename = "WRITTEN")]
    pub written: String,

    #[tabled(rename = "PARTIAL")]
    pub partial: String,
}

impl CacheStatusDisplay {
    pub fn new(dataset: &str, status: &CacheStatus) -> Self {
        let state = match (status.valid, status.written_at) {
            (true, _) => "valid",
            (false, Some(_)) => "expired",
            (false, None) => "missing",
        };
        let dash = || "--".to_string();

        Self {
            dataset: dataset.to_string(),
            state: state.to_string(),
            rows: status.row_count.map(|n| n.to_string()).unwrap_or_else(dash),
            age: status.age.map(format_age).unwrap_or_else(dash),
            ttl: status
                .ttl_seconds
                .map(|s| format!("{}s", s))
                .unwrap_or_else(dash),
            written: status
                .written_at
                .as_ref()
                .map(format_timestamp_local)
                .unwrap_or_else(dash),
            partial: if status.partial { "\u{2713}".to_string() } else { String::new() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_missing_status() {
        let display = CacheStatusDisplay::new("monitors", &CacheStatus::missing());
        assert_eq!(display.state, "missing");
        assert_eq!(display.rows, "--");
        assert_eq!(display.age, "--");
    }

    #[test]
    fn test_expired_status() {
        let status = CacheStatus {
            valid: false,
            age: Some(Duration::from_secs(400)),
            row_count: Some(12),
            written_at: Some(Utc::now()),
            ttl_seconds: Some(300),
            partial: true,
        };
        let display = CacheStatusDisplay::new("monitors", &status);
        assert_eq!(display.state, "expired");
        assert_eq!(display.rows, "12");
        assert_eq!(display.age, "6m 40s");
        assert_eq!(display.ttl, "300s");
        assert_eq!(display.partial, "\u{2713}");
    }
}
