//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod context;
pub mod init;
pub mod monitors;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

/// hnmon - cached, batched view of Hypernative monitoring coverage
#[derive(Parser, Debug)]
#[command(name = "hnmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "HNMON_FORMAT",
        default_value = "table",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "HNMON_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "HNMON_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Don't read or write the on-disk cache
    #[arg(long, global = true, env = "HNMON_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Override the Hypernative API host
    #[arg(long, global = true, env = "HNMON_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Override the cache directory
    #[arg(long, global = true, env = "HNMON_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize hnmon configuration
    Init,

    /// Show credential, configuration and cache status
    Status,

    /// Display version information
    Version,

    /// Query the aggregated monitor dataset
    #[command(subcommand)]
    Monitors(MonitorCommands),

    /// Manage the local dataset cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Monitor dataset subcommands
#[derive(Subcommand, Debug)]
pub enum MonitorCommands {
    /// List monitor rows, from cache when fresh
    List {
        /// Ignore the cache and fetch everything again
        #[arg(long, short = 'r')]
        refresh: bool,

        /// Only rows for this client (case-insensitive)
        #[arg(long)]
        client: Option<String>,

        /// Show at most this many rows
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Only process the first N suits
        #[arg(long)]
        limit_suits: Option<usize>,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache status for the monitors dataset
    Status,

    /// Remove every cached dataset
    Clear,

    /// Print the cache directory
    Path,
}
