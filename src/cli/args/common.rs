//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - rows grouped by suit
    Pretty,
    /// Table format - one row per monitor and channel (global default)
    #[default]
    Table,
    /// JSON format - structured for scripts
    Json,
}
