//! Flags that apply to every subcommand

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;

/// Flag and `HNMON_*` environment values, before the config file is read.
///
/// Anything set here wins over the config file; see [`GlobalOptions::apply_overrides`].
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub format: OutputFormat,

    /// Config file path; `None` means `~/.hnmon/config.yaml`
    pub config: Option<String>,

    /// Keep the dataset in memory only for this run
    pub no_cache: bool,

    pub api_host: Option<String>,

    pub cache_dir: Option<String>,
}

impl GlobalOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            no_cache: cli.no_cache,
            api_host: cli.api_host.clone(),
            cache_dir: cli.cache_dir.clone(),
        }
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Write the API host and cache directory overrides into `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.api_host {
            config.api_host = Some(host.clone());
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = Some(PathBuf::from(dir));
        }
    }
}
