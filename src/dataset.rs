//! Aggregated rows and the dataset produced by one refresh run

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{FetchResult, FetchTask, ResourceKind};

/// One flattened monitor record.
///
/// Column names match the historical export so downstream spreadsheets keep
/// working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Resource the row was produced from
    pub resource_id: String,

    pub full_suite_name: String,
    pub suit_contract_type: String,
    pub suit_blockchain: String,
    pub suit_protocol: String,
    pub suit_address: String,
    pub suit_symbol: String,
    pub suit_label: String,

    pub full_monitor_name: String,
    pub monitor_type: String,
    #[serde(rename = "monitorRiskID")]
    pub monitor_risk_id: String,
    pub monitor_contract_type: String,
    pub monitor_blockchain: String,
    pub monitor_protocol: String,
    pub monitor_address: String,
    pub monitor_symbol: String,
    pub monitor_label: String,
    pub monitor_alert_channel: String,
    pub monitor_description: String,
    pub monitor_link: String,

    /// Kind label of the source resource ("Watchlist", "Custom Agent", ...)
    pub monitor: String,

    #[serde(rename = "Client")]
    pub client: String,
}

/// A task that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTask {
    pub task: FetchTask,
    pub error_kind: String,
    pub message: String,
}

/// Materialized result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub row_count: usize,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub task_counts: BTreeMap<ResourceKind, usize>,
    #[serde(default)]
    pub failures: Vec<FailedTask>,
    #[serde(default)]
    pub partial: bool,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Merge scheduler results into a dataset.
    ///
    /// Rows keep task submission order. Failed tasks are recorded and mark the
    /// dataset partial; they never abort the merge.
    pub fn from_results<I>(results: I, mut task_counts: BTreeMap<ResourceKind, usize>) -> Self
    where
        I: IntoIterator<Item = (FetchTask, FetchResult)>,
    {
        let mut rows = Vec::new();
        let mut failures = Vec::new();

        for (task, result) in results {
            *task_counts.entry(task.kind()).or_default() += 1;
            match result {
                Ok(output) => rows.extend(output.rows),
                Err(err) => failures.push(FailedTask {
                    error_kind: err.kind().to_string(),
                    message: err.to_string(),
                    task,
                }),
            }
        }

        Self {
            row_count: rows.len(),
            fetched_at: Utc::now(),
            task_counts,
            partial: !failures.is_empty(),
            failures,
            rows,
        }
    }

    /// Whether the recorded row count agrees with the rows actually held.
    pub fn is_consistent(&self) -> bool {
        self.row_count == self.rows.len()
    }

    /// Number of tasks that were scheduled, across all kinds.
    pub fn total_tasks(&self) -> usize {
        self.task_counts.values().sum()
    }

    /// Consistent dataset of `n` placeholder rows
    #[cfg(test)]
    pub fn sample(n: usize) -> Self {
        let rows: Vec<Row> = (0..n)
            .map(|i| Row {
                resource_id: format!("res-{}", i),
                ..Row::default()
            })
            .collect();
        Self {
            row_count: rows.len(),
            fetched_at: Utc::now(),
            task_counts: BTreeMap::new(),
            failures: Vec::new(),
            partial: false,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TaskFailure, TransportError};
    use crate::task::TaskOutput;

    fn row(id: &str) -> Row {
        Row {
            resource_id: id.to_string(),
            ..Row::default()
        }
    }

    fn ok(id: &str, n: usize) -> (FetchTask, FetchResult) {
        (
            FetchTask::child(ResourceKind::Watchlist, id, "suit"),
            Ok(TaskOutput::rows((0..n).map(|_| row(id)).collect())),
        )
    }

    #[test]
    fn test_merge_preserves_submission_order() {
        let dataset = Dataset::from_results(vec![ok("a", 2), ok("b", 1), ok("c", 3)], BTreeMap::new());

        let ids: Vec<&str> = dataset.rows.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a", "b", "c", "c", "c"]);
        assert_eq!(dataset.row_count, 6);
        assert!(!dataset.partial);
        assert!(dataset.is_consistent());
    }

    #[test]
    fn test_merge_records_failures_as_partial() {
        let failed = (
            FetchTask::child(ResourceKind::CustomAgent, "bad", "suit"),
            Err(TaskFailure::from(TransportError::HttpError {
                status: 404,
                message: "gone".to_string(),
            })),
        );
        let dataset = Dataset::from_results(vec![ok("a", 1), failed, ok("b", 1)], BTreeMap::new());

        assert!(dataset.partial);
        assert_eq!(dataset.row_count, 2);
        assert_eq!(dataset.failures.len(), 1);
        assert_eq!(dataset.failures[0].task.id(), "bad");
        assert_eq!(dataset.failures[0].error_kind, "http");
        assert_eq!(dataset.task_counts[&ResourceKind::Watchlist], 2);
        assert_eq!(dataset.task_counts[&ResourceKind::CustomAgent], 1);
    }

    #[test]
    fn test_duplicates_across_tasks_are_kept() {
        let dataset = Dataset::from_results(vec![ok("same", 1), ok("same", 1)], BTreeMap::new());
        assert_eq!(dataset.row_count, 2);
        assert_eq!(dataset.rows[0], dataset.rows[1]);
    }

    #[test]
    fn test_row_uses_historical_column_names() {
        let json = serde_json::to_value(row("x")).unwrap();
        assert!(json.get("monitorRiskID").is_some());
        assert!(json.get("Client").is_some());
        assert!(json.get("fullSuiteName").is_some());
        assert!(json.get("resourceId").is_some());
    }

    #[test]
    fn test_task_counts_round_trip_through_json() {
        let mut counts = BTreeMap::new();
        counts.insert(ResourceKind::Suit, 4);
        let dataset = Dataset::from_results(vec![ok("a", 1)], counts);

        let json = serde_json::to_string(&dataset).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_counts[&ResourceKind::Suit], 4);
        assert_eq!(back.total_tasks(), 5);
    }
}
