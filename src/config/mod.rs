//! Configuration management for hnmon

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::retry::RetryPolicy;
use crate::client::transport::{Credentials, TransportSettings};
use crate::error::{ConfigError, Result};

/// Default Hypernative API host
pub const DEFAULT_API_HOST: &str = "https://api.hypernative.xyz";

/// Default Hypernative web app host, used to build monitor links
pub const DEFAULT_APP_HOST: &str = "https://app.hypernative.xyz";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hypernative client ID (sent as `x-client-id`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Hypernative client secret (sent as `x-client-secret`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Custom API host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Custom web app host for monitor links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_host: Option<String>,

    /// Fetch pipeline tuning
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Dataset cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Alert channel to client mapping
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelClient>,
}

/// Concurrency, timeout and retry knobs for a refresh run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Relative jitter applied to each backoff delay (0.2 = ±20%)
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Request rate once the API has answered 429
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_batch_size() -> usize {
    5
}

fn default_max_concurrent_batches() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_jitter() -> f64 {
    0.2
}

fn default_requests_per_second() -> u32 {
    6
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Dataset cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Cache directory (defaults to ~/.cache/hnmon)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_ttl_secs() -> u64 {
    300
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            dir: None,
        }
    }
}

/// Maps an alert channel name to the client it notifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelClient {
    pub name: String,
    pub client: String,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".hnmon").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete config path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration, honoring an optional path override.
    ///
    /// A missing file at the default location yields an empty config so that
    /// environment-only setups work. An explicit path must exist.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let resolved = Self::resolve_path(path)?;
        if !resolved.exists() {
            return match path {
                Some(_) => Err(ConfigError::NotFound.into()),
                None => Ok(Self::default()),
            };
        }
        Self::load_from(&resolved)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration, honoring an optional path override
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(&Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Credentials live here
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Fill credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Fill credentials from `lookup`. Environment values win over the file.
    ///
    /// `HNMON_CLIENT_ID`/`HNMON_CLIENT_SECRET` take precedence over the legacy
    /// `ID_HYPERNATIVE`/`KEY_HYPERNATIVE` names.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |primary: &str, legacy: &str| {
            lookup(primary)
                .or_else(|| lookup(legacy))
                .filter(|v| !v.is_empty())
        };

        if let Some(id) = pick("HNMON_CLIENT_ID", "ID_HYPERNATIVE") {
            self.client_id = Some(id);
        }
        if let Some(secret) = pick("HNMON_CLIENT_SECRET", "KEY_HYPERNATIVE") {
            self.client_secret = Some(secret);
        }
    }

    /// Validate that credentials are present and return them
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok(Credentials::new(id.clone(), secret.clone())),
            _ => Err(ConfigError::MissingCredentials.into()),
        }
    }

    /// Reject settings the fetch pipeline can't run with
    pub fn validate(&self) -> Result<()> {
        let fetch = &self.fetch;
        if fetch.batch_size == 0 {
            return Err(ConfigError::Invalid("fetch.batch_size must be at least 1".to_string()).into());
        }
        if fetch.max_concurrent_batches == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_concurrent_batches must be at least 1".to_string(),
            )
            .into());
        }
        if fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be at least 1".to_string()).into());
        }
        if fetch.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "fetch.requests_per_second must be at least 1".to_string(),
            )
            .into());
        }
        if !(0.0..1.0).contains(&fetch.jitter) {
            return Err(ConfigError::Invalid("fetch.jitter must be in [0, 1)".to_string()).into());
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be greater than zero".to_string()).into());
        }
        Ok(())
    }

    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    pub fn app_host(&self) -> &str {
        self.app_host.as_deref().unwrap_or(DEFAULT_APP_HOST)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch.max_attempts,
            base_delay: Duration::from_millis(self.fetch.base_delay_ms),
            max_delay: Duration::from_millis(self.fetch.max_delay_ms),
            jitter: self.fetch.jitter,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            retry: self.retry_policy(),
            requests_per_second: self.fetch.requests_per_second,
        }
    }

    /// Alert channel name to client lookup table. `None` placeholders are skipped.
    pub fn channel_clients(&self) -> HashMap<String, String> {
        self.channels
            .iter()
            .filter(|c| !c.client.is_empty() && c.client != "None")
            .map(|c| (c.name.clone(), c.client.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.client_id.is_none());
        assert_eq!(config.fetch.batch_size, 5);
        assert_eq!(config.fetch.max_concurrent_batches, 3);
        assert_eq!(config.fetch.request_timeout_secs, 5);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "client_id: abc\nfetch:\n  batch_size: 10\nchannels:\n  - name: ops-slack\n    client: Acme DAO\n  - name: spare\n    client: None\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.fetch.batch_size, 10);
        assert_eq!(config.fetch.max_concurrent_batches, 3);
        assert_eq!(config.cache.ttl_secs, 300);
        let clients = config.channel_clients();
        assert_eq!(clients.get("ops-slack").map(String::as_str), Some("Acme DAO"));
        assert!(!clients.contains_key("spare"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.client_id.as_deref(), Some("id"));
        assert_eq!(loaded.client_secret.as_deref(), Some("secret"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_explicit_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = Config::load_at(Some(missing.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(ConfigError::NotFound)));
    }

    #[test]
    fn test_env_overrides_and_legacy_names() {
        let mut config = Config {
            client_id: Some("file-id".to_string()),
            ..Config::default()
        };
        config.apply_env_with(|key| match key {
            "ID_HYPERNATIVE" => Some("legacy-id".to_string()),
            "KEY_HYPERNATIVE" => Some("legacy-secret".to_string()),
            "HNMON_CLIENT_SECRET" => Some("new-secret".to_string()),
            _ => None,
        });

        assert_eq!(config.client_id.as_deref(), Some("legacy-id"));
        assert_eq!(config.client_secret.as_deref(), Some("new-secret"));
        assert!(config.credentials().is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        let err = config.credentials().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.fetch.max_concurrent_batches = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.jitter = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
    }
}
