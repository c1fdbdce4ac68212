//! Mock Hypernative API client for testing
//!
//! Serves canned suits and detail payloads, can fail chosen resources, and
//! records call counts plus peak concurrency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::models::{
    AlertPolicy, ChannelConfiguration, CustomAgent, Monitor, ResourceRef, Rule, Suit, Watchlist,
};
use super::{ApiResult, HypernativeApi};
use crate::error::{TaskFailure, TransportError};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockHypernativeApi::new()
///     .with_suit("s-1", "[TOKEN] ethereum 0xabc USDC Circle", &["wl-1"], &[])
///     .with_watchlist("wl-1", "R-1 [L2] Optimism", &["slack"]);
/// ```
#[derive(Default)]
pub struct MockHypernativeApi {
    suits: Mutex<Vec<Suit>>,
    watchlists: HashMap<String, Watchlist>,
    custom_agents: HashMap<String, CustomAgent>,
    monitors: HashMap<String, Monitor>,
    /// Resource IDs that fail with the given HTTP status
    failures: HashMap<String, u16>,
    enumeration_failure: Option<u16>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn policies(channels: &[&str]) -> Option<Vec<AlertPolicy>> {
    if channels.is_empty() {
        return None;
    }
    Some(vec![AlertPolicy {
        channels_configurations: channels
            .iter()
            .map(|c| ChannelConfiguration {
                name: Some(c.to_string()),
            })
            .collect(),
    }])
}

fn refs(ids: &[&str]) -> Vec<ResourceRef> {
    ids.iter().map(|id| ResourceRef::new(*id)).collect()
}

impl MockHypernativeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suit(self, id: &str, name: &str, watchlists: &[&str], agents: &[&str]) -> Self {
        if let Ok(mut suits) = self.suits.lock() {
            suits.push(Suit {
                id: id.to_string(),
                name: name.to_string(),
                watchlists: refs(watchlists),
                custom_agents: refs(agents),
            });
        }
        self
    }

    pub fn with_watchlist(mut self, id: &str, name: &str, channels: &[&str]) -> Self {
        self.watchlists.insert(
            id.to_string(),
            Watchlist {
                name: name.to_string(),
                description: Some(format!("{} description", id)),
                alert_policies: policies(channels),
                monitors: Vec::new(),
            },
        );
        self
    }

    pub fn with_watchlist_monitors(mut self, id: &str, name: &str, monitors: &[&str]) -> Self {
        self.watchlists.insert(
            id.to_string(),
            Watchlist {
                name: name.to_string(),
                description: None,
                alert_policies: None,
                monitors: refs(monitors),
            },
        );
        self
    }

    pub fn with_custom_agent(
        mut self,
        id: &str,
        name: &str,
        agent_type: Option<&str>,
        channels: &[&str],
    ) -> Self {
        self.custom_agents.insert(
            id.to_string(),
            CustomAgent {
                agent_name: name.to_string(),
                agent_type: agent_type.map(str::to_string),
                rule: Some(Rule {
                    rule_string: Some(format!("rule for {}", id)),
                }),
                alert_policies: policies(channels),
                monitors: Vec::new(),
            },
        );
        self
    }

    /// Replace the rule string of an agent added with `with_custom_agent`
    pub fn with_agent_rule(mut self, id: &str, rule_string: Option<&str>) -> Self {
        if let Some(agent) = self.custom_agents.get_mut(id) {
            agent.rule = Some(Rule {
                rule_string: rule_string.map(str::to_string),
            });
        }
        self
    }

    pub fn with_monitor(mut self, id: &str, name: &str, channels: &[&str]) -> Self {
        self.monitors.insert(
            id.to_string(),
            Monitor {
                name: name.to_string(),
                description: Some(format!("{} description", id)),
                alert_policies: policies(channels),
            },
        );
        self
    }

    /// Fail every fetch of `id` with `status`
    pub fn with_failure(mut self, id: &str, status: u16) -> Self {
        self.failures.insert(id.to_string(), status);
        self
    }

    /// Fail suit enumeration with `status`
    pub fn with_enumeration_failure(mut self, status: u16) -> Self {
        self.enumeration_failure = Some(status);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace the suit list, simulating upstream changes between runs
    pub fn set_suits(&self, suits: Vec<Suit>) {
        if let Ok(mut current) = self.suits.lock() {
            *current = suits;
        }
    }

    /// Total calls made, enumeration included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of detail calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn error_for(status: u16) -> TaskFailure {
        let last = TransportError::HttpError {
            status,
            message: "mock failure".to_string(),
        };
        if last.is_retriable() {
            TaskFailure::from(TransportError::RetriesExhausted {
                attempts: 3,
                last: Box::new(last),
            })
        } else {
            TaskFailure::from(last)
        }
    }

    async fn lookup<T: Clone>(&self, id: &str, table: &HashMap<String, T>) -> ApiResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(status) = self.failures.get(id) {
            return Err(Self::error_for(*status));
        }
        table.get(id).cloned().ok_or_else(|| {
            TaskFailure::from(TransportError::HttpError {
                status: 404,
                message: format!("{} not found", id),
            })
        })
    }
}

#[async_trait]
impl HypernativeApi for MockHypernativeApi {
    async fn list_suits(&self) -> ApiResult<Vec<Suit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.enumeration_failure {
            return Err(Self::error_for(status));
        }
        Ok(self.suits.lock().map(|s| s.clone()).unwrap_or_default())
    }

    async fn get_watchlist(&self, id: &str) -> ApiResult<Watchlist> {
        self.lookup(id, &self.watchlists).await
    }

    async fn get_custom_agent(&self, id: &str) -> ApiResult<CustomAgent> {
        self.lookup(id, &self.custom_agents).await
    }

    async fn get_monitor(&self, id: &str) -> ApiResult<Monitor> {
        self.lookup(id, &self.monitors).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls_and_fails_on_request() {
        let mock = MockHypernativeApi::new()
            .with_suit("s-1", "[TOKEN] ethereum 0x1 A", &["wl-1", "wl-2"], &[])
            .with_watchlist("wl-1", "R-1 [L2] Optimism", &["slack"])
            .with_failure("wl-2", 500);

        assert_eq!(mock.list_suits().await.unwrap().len(), 1);
        assert!(mock.get_watchlist("wl-1").await.is_ok());
        let err = mock.get_watchlist("wl-2").await.unwrap_err();
        assert_eq!(err.kind(), "retries_exhausted");
        let missing = mock.get_watchlist("nope").await.unwrap_err();
        assert_eq!(missing.kind(), "http");
        assert_eq!(mock.calls(), 4);
    }
}
