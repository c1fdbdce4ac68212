//! Monitor listing command

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, debug, log_enabled};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cli::{CommandContext, OutputFormat};
use crate::client::Progress;
use crate::dataset::{Dataset, FailedTask, Row};
use crate::error::Result;
use crate::models::{MonitorRowDisplay, format_pretty};
use crate::output::json::format_json;
use crate::output::table::format_table;
use crate::output::{Formattable, print};
use crate::task::ResourceKind;

/// Dataset rows selected for output, with the run metadata they came from.
pub struct MonitorListing {
    dataset: Dataset,
    rows: Vec<Row>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingJson<'a> {
    row_count: usize,
    total_rows: usize,
    fetched_at: DateTime<Utc>,
    partial: bool,
    task_counts: &'a BTreeMap<ResourceKind, usize>,
    failures: &'a [FailedTask],
    rows: &'a [Row],
}

impl MonitorListing {
    /// Keep rows for `client` (case-insensitive), then at most `limit` of them.
    pub fn new(dataset: Dataset, client: Option<&str>, limit: Option<usize>) -> Self {
        let rows = select_rows(&dataset.rows, client, limit);
        Self { dataset, rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl Formattable for MonitorListing {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Table => {
                let displays: Vec<MonitorRowDisplay> =
                    self.rows.iter().map(MonitorRowDisplay::from).collect();
                format_table(&displays)
            }
            OutputFormat::Pretty => format_pretty(&self.rows),
            OutputFormat::Json => format_json(&ListingJson {
                row_count: self.rows.len(),
                total_rows: self.dataset.row_count,
                fetched_at: self.dataset.fetched_at,
                partial: self.dataset.partial,
                task_counts: &self.dataset.task_counts,
                failures: &self.dataset.failures,
                rows: &self.rows,
            })?,
        })
    }
}

fn select_rows(rows: &[Row], client: Option<&str>, limit: Option<usize>) -> Vec<Row> {
    rows.iter()
        .filter(|row| client.is_none_or(|c| row.client.eq_ignore_ascii_case(c)))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Run `monitors list`
pub async fn list(
    ctx: &CommandContext,
    refresh: bool,
    client: Option<&str>,
    limit: Option<usize>,
    limit_suits: Option<usize>,
) -> Result<()> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let orchestrator = ctx.orchestrator(limit_suits)?.with_progress(sender);
    let progress = spawn_progress(receiver);

    let result = orchestrator.get_dataset(refresh).await;
    if log_enabled!(Level::Debug) {
        match orchestrator.cache_status().await {
            Ok(status) => debug!(
                "Cache entry written {:?}, ttl {:?}s",
                status.written_at, status.ttl_seconds
            ),
            Err(e) => debug!("Cache status unavailable: {}", e),
        }
    }
    // Closing the channel ends the progress task
    drop(orchestrator);
    if let Err(e) = progress.await {
        debug!("Progress display task failed: {}", e);
    }
    let dataset = result?;

    if dataset.partial {
        eprintln!(
            "{} {} of {} fetches failed; results are partial",
            "⚠".yellow(),
            dataset.failures.len(),
            dataset.total_tasks()
        );
        for failure in &dataset.failures {
            debug!(
                "{} {} failed ({}): {}",
                failure.task.kind(),
                failure.task.id(),
                failure.error_kind,
                failure.message
            );
        }
    }

    let listing = MonitorListing::new(dataset, client, limit);
    debug!("Showing {} rows", listing.rows().len());
    print(&listing, ctx.format)
}

/// Draw a bar on stderr while a refresh runs. Cache hits never send updates,
/// so no bar appears for them.
fn spawn_progress(mut receiver: mpsc::UnboundedReceiver<Progress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(update) = receiver.recv().await {
            let bar = bar.get_or_insert_with(|| {
                let bar = ProgressBar::new(update.total as u64);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner} Fetching monitors [{bar:30}] {pos}/{len} ({elapsed})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            });
            bar.set_length(update.total as u64);
            bar.set_position(update.completed as u64);
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}
