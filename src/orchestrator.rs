//! Aggregation orchestrator
//!
//! Walks suits, then their watchlists and custom agents, then any monitors
//! those reference, and flattens everything into one [`Dataset`]. The result
//! is memoized in a [`CacheStore`] for the configured TTL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::cache::{CacheStatus, CacheStore, MONITORS_DATASET, cache_key};
use crate::client::models::alert_channels;
use crate::client::{BatchScheduler, HypernativeApi, Progress, ProgressTracker};
use crate::config::DEFAULT_APP_HOST;
use crate::dataset::{Dataset, Row};
use crate::error::{CacheError, OrchestratorError, TaskFailure};
use crate::naming::{MonitorName, SuitName, parse_custom_agent_name, parse_suit_name, parse_watchlist_name};
use crate::task::{FetchResult, FetchTask, ResourceKind, TaskOutput};

/// Channel and client recorded when a resource has no alert channel
const NO_CHANNEL: &str = "None";

/// Knobs for one orchestrator instance
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Cache key of the dataset this orchestrator produces
    pub dataset_key: String,
    pub ttl: Duration,
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    /// Web app host used for monitor links
    pub app_host: String,
    /// Only process the first N suits
    pub limit_suits: Option<usize>,
    /// Alert channel name to client
    pub channel_clients: HashMap<String, String>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            dataset_key: cache_key(MONITORS_DATASET, &[]),
            ttl: Duration::from_secs(300),
            batch_size: 5,
            max_concurrent_batches: 3,
            app_host: DEFAULT_APP_HOST.to_string(),
            limit_suits: None,
            channel_clients: HashMap::new(),
        }
    }
}

/// Parsed suit a task descends from
struct SuitContext {
    full_name: String,
    name: SuitName,
}

/// Parsed suits by ID. Tasks carry their suit ID, so a resource shared by
/// several suits resolves per task.
#[derive(Default)]
struct Lineage {
    suits: HashMap<String, SuitContext>,
}

impl Lineage {
    fn suit_for(&self, task: &FetchTask) -> Option<&SuitContext> {
        self.suits.get(task.suit_id()?)
    }
}

/// Everything a detail payload contributes to its rows
struct MonitorDetail {
    full_name: String,
    name: MonitorName,
    monitor_type: String,
    description: String,
    link: String,
    channels: Vec<String>,
}

/// Produces the monitors dataset, from cache when possible.
///
/// Holds its collaborators by value; several orchestrators with different
/// credentials or stores can coexist.
pub struct Orchestrator<A, S: ?Sized> {
    api: Arc<A>,
    store: Arc<S>,
    scheduler: BatchScheduler,
    settings: OrchestratorSettings,
    progress: Option<UnboundedSender<Progress>>,
    refresh_lock: Mutex<()>,
}

impl<A: HypernativeApi, S: CacheStore + ?Sized> Orchestrator<A, S> {
    pub fn new(api: Arc<A>, store: Arc<S>, settings: OrchestratorSettings) -> Self {
        Self {
            scheduler: BatchScheduler::new(settings.batch_size, settings.max_concurrent_batches),
            api,
            store,
            settings,
            progress: None,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Send `(completed, total)` updates to `sender` during refreshes
    pub fn with_progress(mut self, sender: UnboundedSender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Return the dataset, serving a valid cache entry unless `force_refresh`.
    ///
    /// Concurrent callers that miss share one refresh: the second waits for
    /// the first and then reads its entry.
    pub async fn get_dataset(&self, force_refresh: bool) -> Result<Dataset, OrchestratorError> {
        if !force_refresh {
            if let Some(dataset) = self.cached().await {
                return Ok(dataset);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            if let Some(dataset) = self.cached().await {
                debug!("Cache filled by a concurrent refresh");
                return Ok(dataset);
            }
        }

        self.refresh().await
    }

    /// Cache state of this orchestrator's dataset
    pub async fn cache_status(&self) -> Result<CacheStatus, OrchestratorError> {
        Ok(self.store.status(&self.settings.dataset_key).await?)
    }

    /// Drop the cached dataset so the next read refetches
    pub async fn invalidate(&self) -> Result<(), OrchestratorError> {
        Ok(self.store.invalidate(&self.settings.dataset_key).await?)
    }

    async fn cached(&self) -> Option<Dataset> {
        let key = &self.settings.dataset_key;
        match self.store.get(key).await {
            Ok(Some(entry)) => {
                debug!(
                    "Cache hit: {} rows, written {}",
                    entry.dataset.row_count, entry.written_at
                );
                Some(entry.dataset)
            }
            Ok(None) => {
                debug!("Cache miss");
                None
            }
            Err(CacheError::Corrupted(reason)) => {
                warn!("Discarding corrupted cache entry: {}", reason);
                if let Err(e) = self.invalidate().await {
                    warn!("Failed to remove corrupted cache entry: {}", e);
                }
                None
            }
            Err(e) => {
                warn!("Cache read failed, fetching fresh data: {}", e);
                None
            }
        }
    }

    async fn refresh(&self) -> Result<Dataset, OrchestratorError> {
        let started = Instant::now();
        let progress = ProgressTracker::new(self.progress.clone());

        let mut suits = self
            .api
            .list_suits()
            .await
            .map_err(|e| OrchestratorError::EnumerationFailed(e.to_string()))?;
        if suits.is_empty() {
            return Err(OrchestratorError::EnumerationFailed(
                "no suits returned".to_string(),
            ));
        }
        info!("Found {} suits", suits.len());
        if let Some(limit) = self.settings.limit_suits {
            suits.truncate(limit);
            info!("Limited to {} suits", suits.len());
        }

        let mut lineage = Lineage::default();
        let mut second_tier = Vec::new();
        for suit in &suits {
            let Some(name) = parse_suit_name(&suit.name) else {
                debug!("Skipping suit {} ({:?})", suit.id, suit.name);
                continue;
            };
            for watchlist in &suit.watchlists {
                second_tier.push(FetchTask::child(ResourceKind::Watchlist, &watchlist.id, &suit.id));
            }
            for agent in &suit.custom_agents {
                second_tier.push(FetchTask::child(ResourceKind::CustomAgent, &agent.id, &suit.id));
            }
            lineage.suits.entry(suit.id.clone()).or_insert(SuitContext {
                full_name: suit.name.clone(),
                name,
            });
        }
        progress.add_total(second_tier.len());
        let second_results = self
            .scheduler
            .run(&second_tier, &progress, |task| self.fetch(task, &lineage))
            .await;

        let third_tier: Vec<FetchTask> = second_results
            .iter()
            .filter_map(|result| result.as_ref().ok())
            .flat_map(|output| output.children.iter().cloned())
            .collect();

        progress.add_total(third_tier.len());
        let third_results = self
            .scheduler
            .run(&third_tier, &progress, |task| self.fetch(task, &lineage))
            .await;

        let mut task_counts = BTreeMap::new();
        task_counts.insert(ResourceKind::Suit, suits.len());
        let dataset = Dataset::from_results(
            second_tier
                .into_iter()
                .zip(second_results)
                .chain(third_tier.into_iter().zip(third_results)),
            task_counts,
        );

        if let Err(e) = self
            .store
            .put(&self.settings.dataset_key, &dataset, self.settings.ttl)
            .await
        {
            warn!("Failed to cache dataset, returning uncached result: {}", e);
        }

        info!(
            "Finished in {:.2}s with {} rows from {} tasks ({} failed)",
            started.elapsed().as_secs_f64(),
            dataset.row_count,
            dataset.total_tasks(),
            dataset.failures.len()
        );
        Ok(dataset)
    }

    async fn fetch(&self, task: FetchTask, lineage: &Lineage) -> FetchResult {
        let Some(suit) = lineage.suit_for(&task) else {
            debug!("{} has no known suit, skipping", task);
            return Ok(TaskOutput::default());
        };

        match task.kind() {
            ResourceKind::Watchlist => {
                let watchlist = self.api.get_watchlist(task.id()).await?;
                let children = monitor_tasks(&task, &watchlist.monitors);
                let Some(name) = parse_watchlist_name(&watchlist.name) else {
                    debug!("Unrecognized watchlist name {:?}", watchlist.name);
                    return Ok(TaskOutput { rows: Vec::new(), children });
                };
                let detail = MonitorDetail {
                    monitor_type: ResourceKind::Watchlist.label().to_string(),
                    description: watchlist.description.clone().unwrap_or_default(),
                    link: format!("{}/watchlist/{}", self.settings.app_host, task.id()),
                    channels: alert_channels(watchlist.alert_policies.as_deref()),
                    full_name: watchlist.name,
                    name,
                };
                Ok(TaskOutput {
                    rows: self.build_rows(&task, suit, detail),
                    children,
                })
            }
            ResourceKind::CustomAgent => {
                let agent = self.api.get_custom_agent(task.id()).await?;
                let children = monitor_tasks(&task, &agent.monitors);
                let Some(name) = parse_custom_agent_name(&agent.agent_name) else {
                    debug!("Unrecognized custom agent name {:?}", agent.agent_name);
                    return Ok(TaskOutput { rows: Vec::new(), children });
                };
                let description = agent
                    .rule
                    .as_ref()
                    .and_then(|rule| rule.rule_string.clone())
                    .unwrap_or_else(|| agent.agent_name.clone());
                let detail = MonitorDetail {
                    monitor_type: agent
                        .agent_type
                        .clone()
                        .unwrap_or_else(|| ResourceKind::CustomAgent.label().to_string()),
                    description,
                    link: format!(
                        "{}/custom-agents?agentId={}",
                        self.settings.app_host,
                        task.id()
                    ),
                    channels: alert_channels(agent.alert_policies.as_deref()),
                    full_name: agent.agent_name,
                    name,
                };
                Ok(TaskOutput {
                    rows: self.build_rows(&task, suit, detail),
                    children,
                })
            }
            ResourceKind::Monitor => {
                let monitor = self.api.get_monitor(task.id()).await?;
                let Some(name) = parse_custom_agent_name(&monitor.name) else {
                    debug!("Unrecognized monitor name {:?}", monitor.name);
                    return Ok(TaskOutput::default());
                };
                let detail = MonitorDetail {
                    monitor_type: ResourceKind::Monitor.label().to_string(),
                    description: monitor.description.clone().unwrap_or_default(),
                    link: String::new(),
                    channels: alert_channels(monitor.alert_policies.as_deref()),
                    full_name: monitor.name,
                    name,
                };
                Ok(TaskOutput::rows(self.build_rows(&task, suit, detail)))
            }
            ResourceKind::Suit => Err(TaskFailure::Unsupported(ResourceKind::Suit)),
        }
    }

    /// One row per alert channel, or a single `None` row.
    fn build_rows(&self, task: &FetchTask, suit: &SuitContext, detail: MonitorDetail) -> Vec<Row> {
        let channels = if detail.channels.is_empty() {
            vec![NO_CHANNEL.to_string()]
        } else {
            detail.channels.clone()
        };

        channels
            .into_iter()
            .map(|channel| Row {
                resource_id: task.id().to_string(),
                full_suite_name: suit.full_name.clone(),
                suit_contract_type: suit.name.contract_type.clone(),
                suit_blockchain: suit.name.blockchain.clone(),
                suit_protocol: suit.name.protocol.clone(),
                suit_address: suit.name.address.clone(),
                suit_symbol: suit.name.symbol.clone(),
                suit_label: suit.name.label.clone(),
                full_monitor_name: detail.full_name.clone(),
                monitor_type: detail.monitor_type.clone(),
                monitor_risk_id: detail.name.risk_id.clone(),
                monitor_contract_type: detail.name.contract_type.clone(),
                monitor_blockchain: detail.name.blockchain.clone(),
                monitor_protocol: detail.name.protocol.clone(),
                monitor_address: detail.name.address.clone(),
                monitor_symbol: detail.name.symbol.clone(),
                monitor_label: detail.name.label.clone(),
                monitor_description: detail.description.clone(),
                monitor_link: detail.link.clone(),
                monitor: task.kind().label().to_string(),
                client: self
                    .settings
                    .channel_clients
                    .get(&channel)
                    .cloned()
                    .unwrap_or_else(|| NO_CHANNEL.to_string()),
                monitor_alert_channel: channel,
            })
            .collect()
    }
}

fn monitor_tasks(parent: &FetchTask, refs: &[crate::client::models::ResourceRef]) -> Vec<FetchTask> {
    refs.iter()
        .map(|r| FetchTask::nested(ResourceKind::Monitor, &r.id, parent))
        .collect()
}
