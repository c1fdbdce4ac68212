//! Fetch task model
//!
//! A [`FetchTask`] names one remote resource. Tasks are created by the
//! orchestrator while it walks the suit hierarchy and are consumed by the
//! batch scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Row;
use crate::error::TaskFailure;

/// Kind of remote resource a task fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Suit,
    Watchlist,
    CustomAgent,
    Monitor,
}

impl ResourceKind {
    /// Human-readable label, also used as the `monitor` row column.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Suit => "Suit",
            ResourceKind::Watchlist => "Watchlist",
            ResourceKind::CustomAgent => "Custom Agent",
            ResourceKind::Monitor => "Monitor",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One remote resource to retrieve. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTask {
    resource_kind: ResourceKind,
    resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    /// Owning suit when the parent is not the suit itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suit_id: Option<String>,
}

impl FetchTask {
    /// Top-level task with no parent.
    pub fn root(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            resource_kind: kind,
            resource_id: id.into(),
            parent_id: None,
            suit_id: None,
        }
    }

    /// Task discovered while enumerating `parent_id`.
    pub fn child(kind: ResourceKind, id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            resource_kind: kind,
            resource_id: id.into(),
            parent_id: Some(parent_id.into()),
            suit_id: None,
        }
    }

    /// Task discovered inside `parent`, inheriting the parent's suit.
    pub fn nested(kind: ResourceKind, id: impl Into<String>, parent: &FetchTask) -> Self {
        Self {
            resource_kind: kind,
            resource_id: id.into(),
            parent_id: Some(parent.resource_id.clone()),
            suit_id: parent.suit_id().map(str::to_string),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource_kind
    }

    pub fn id(&self) -> &str {
        &self.resource_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Suit this task belongs to. Watchlists and custom agents are direct
    /// children of their suit.
    pub fn suit_id(&self) -> Option<&str> {
        self.suit_id.as_deref().or(self.parent_id.as_deref())
    }
}

impl fmt::Display for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource_kind, self.resource_id)
    }
}

/// Successful output of one task: its rows plus any next-tier tasks it revealed.
#[derive(Debug, Clone, Default)]
pub struct TaskOutput {
    pub rows: Vec<Row>,
    pub children: Vec<FetchTask>,
}

impl TaskOutput {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            children: Vec::new(),
        }
    }
}

/// Outcome of executing one task. Never both rows and a failure.
pub type FetchResult = std::result::Result<TaskOutput, TaskFailure>;
