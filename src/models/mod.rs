//! Display models for CLI output
//!
//! Converts dataset rows and cache state into CLI-friendly shapes.

pub mod display;

pub use display::{CacheStatusDisplay, MonitorRowDisplay, format_pretty};
