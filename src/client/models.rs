//! Hypernative API response models

use serde::{Deserialize, Deserializer, Serialize};

/// Standard `{ "data": ... }` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// `{ "results": [...] }` list payload
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Reference to a child resource by ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl ResourceRef {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Security suit, the top of the monitoring hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suit {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub watchlists: Vec<ResourceRef>,

    #[serde(rename = "customAgents", default)]
    pub custom_agents: Vec<ResourceRef>,
}

/// Alert policy attached to a watchlist, agent or monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPolicy {
    #[serde(rename = "channelsConfigurations", default)]
    pub channels_configurations: Vec<ChannelConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfiguration {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "alertPolicies", default)]
    pub alert_policies: Option<Vec<AlertPolicy>>,

    /// Monitors attached below this watchlist
    #[serde(default)]
    pub monitors: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "ruleString", default)]
    pub rule_string: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomAgent {
    #[serde(rename = "agentName", default)]
    pub agent_name: String,

    #[serde(rename = "agentType", default)]
    pub agent_type: Option<String>,

    #[serde(default)]
    pub rule: Option<Rule>,

    #[serde(rename = "alertPolicies", default)]
    pub alert_policies: Option<Vec<AlertPolicy>>,

    #[serde(default)]
    pub monitors: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Monitor {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "alertPolicies", default)]
    pub alert_policies: Option<Vec<AlertPolicy>>,
}

/// Distinct, non-empty channel names across all policies, in first-seen order.
pub fn alert_channels(policies: Option<&[AlertPolicy]>) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for policy in policies.unwrap_or_default() {
        for config in &policy.channels_configurations {
            if let Some(name) = config.name.as_deref() {
                if !name.is_empty() && !channels.iter().any(|c| c == name) {
                    channels.push(name.to_string());
                }
            }
        }
    }
    channels
}

/// Accept IDs serialized either as strings or as integers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
