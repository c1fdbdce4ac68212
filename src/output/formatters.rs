//! Reusable formatting utilities for CLI output
//!
//! Timestamps, ages and byte sizes shared by the monitors, cache and status
//! commands.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Render a UTC timestamp in local time.
///
/// # Example output
/// `01/15/2025 14:30 +01:00`
pub fn format_timestamp_local(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%m/%d/%Y %H:%M %:z")
        .to_string()
}

/// Compact age like `42s`, `3m 5s` or `2h 10m`.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
