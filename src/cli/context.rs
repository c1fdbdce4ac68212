//! Command execution context
//!
//! Loads configuration once, applies CLI/env overrides and wires the cache
//! store and API client into an orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CacheStore, FileCacheStore, MONITORS_DATASET, MemoryCacheStore, cache_key};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::HypernativeClient;
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::{Orchestrator, OrchestratorSettings};

/// Orchestrator as wired by the CLI
pub type MonitorOrchestrator = Orchestrator<HypernativeClient, dyn CacheStore>;

/// Context for command execution containing config, cache store and output options.
pub struct CommandContext {
    /// Loaded and validated configuration, overrides applied
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
    /// Dataset store (memory-only with `--no-cache`)
    pub store: Arc<dyn CacheStore>,
    /// Directory of the on-disk store, even when it is bypassed
    pub cache_dir: PathBuf,
}

impl CommandContext {
    /// Load config and open the cache store.
    ///
    /// Credentials are not required here; commands that call the API check
    /// them in [`CommandContext::orchestrator`].
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Self::load_config(opts)?;

        let cache_dir = match &config.cache.dir {
            Some(dir) => dir.clone(),
            None => FileCacheStore::default_dir()?,
        };

        let store: Arc<dyn CacheStore> = if opts.no_cache {
            log::debug!("Cache disabled, using in-memory store");
            Arc::new(MemoryCacheStore::new())
        } else {
            Arc::new(FileCacheStore::open_at(&cache_dir)?)
        };

        Ok(Self {
            config,
            format: opts.format,
            store,
            cache_dir,
        })
    }

    /// Config with environment and flag overrides applied, validated.
    pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
        let mut config = Config::load_at(opts.config_path())?;
        config.apply_env();
        opts.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Cache key of the monitors dataset for this configuration.
    ///
    /// Different hosts, credentials or suit limits never share an entry.
    pub fn dataset_key(&self, limit_suits: Option<usize>) -> String {
        let limit = limit_suits.map(|n| n.to_string()).unwrap_or_default();
        cache_key(
            MONITORS_DATASET,
            &[
                ("api_host", self.config.api_host()),
                ("client_id", self.config.client_id.as_deref().unwrap_or_default()),
                ("limit_suits", &limit),
            ],
        )
    }

    /// Build an orchestrator. Fails when credentials are missing.
    pub fn orchestrator(&self, limit_suits: Option<usize>) -> Result<MonitorOrchestrator> {
        let credentials = self.config.credentials()?;
        let client = HypernativeClient::new(
            self.config.api_host(),
            credentials,
            self.config.transport_settings(),
        )?;

        let settings = OrchestratorSettings {
            dataset_key: self.dataset_key(limit_suits),
            ttl: self.config.ttl(),
            batch_size: self.config.fetch.batch_size,
            max_concurrent_batches: self.config.fetch.max_concurrent_batches,
            app_host: self.config.app_host().to_string(),
            limit_suits,
            channel_clients: self.config.channel_clients(),
        };

        Ok(Orchestrator::new(Arc::new(client), self.store.clone(), settings))
    }
}
