//! Display model implementations for table and JSON output

mod cache;
mod common;
mod monitor;

pub use cache::CacheStatusDisplay;
pub use monitor::{MonitorRowDisplay, format_pretty};
