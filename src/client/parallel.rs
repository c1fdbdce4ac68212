//! Batched, bounded-concurrency task execution.
//!
//! Tasks are split into consecutive batches of `batch_size`. Up to
//! `max_concurrent_batches` batches run at once and every task in a running
//! batch is in flight together, so at most `batch_size * max_concurrent_batches`
//! requests are outstanding at any moment.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::TaskFailure;
use crate::task::FetchTask;

/// Snapshot of refresh progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Counts completed tasks and forwards updates to an optional listener.
///
/// The total grows as deeper tiers are discovered.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    sender: Option<UnboundedSender<Progress>>,
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(sender: Option<UnboundedSender<Progress>>) -> Self {
        Self {
            sender,
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Tracker with no listener
    #[cfg(test)]
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn add_total(&self, n: usize) {
        self.total.fetch_add(n, Ordering::SeqCst);
        self.emit();
    }

    pub fn complete_one(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.emit();
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }

    fn emit(&self) {
        if let Some(sender) = &self.sender {
            // Listener may be gone; progress is best effort
            let _ = sender.send(self.snapshot());
        }
    }
}

/// Runs fetch tasks in fixed-size batches with a bound on concurrent batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    batch_size: usize,
    max_concurrent_batches: usize,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(5, 3)
    }
}

impl BatchScheduler {
    /// Zero values are raised to 1.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_concurrent_batches: max_concurrent_batches.max(1),
        }
    }

    #[cfg(test)]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[cfg(test)]
    pub fn max_concurrent_batches(&self) -> usize {
        self.max_concurrent_batches
    }

    /// Upper bound on simultaneously running tasks
    #[cfg(test)]
    pub fn max_in_flight(&self) -> usize {
        self.batch_size * self.max_concurrent_batches
    }

    /// Execute every task and return one result per task, in task order.
    ///
    /// A failing task never cancels its siblings. All tasks are drained
    /// before this returns.
    pub async fn run<T, F, Fut>(
        &self,
        tasks: &[FetchTask],
        progress: &ProgressTracker,
        fetch: F,
    ) -> Vec<Result<T, TaskFailure>>
    where
        F: Fn(FetchTask) -> Fut,
        Fut: Future<Output = Result<T, TaskFailure>>,
    {
        if tasks.is_empty() {
            return Vec::new();
        }

        debug!(
            "Scheduling {} tasks in batches of {} ({} concurrent)",
            tasks.len(),
            self.batch_size,
            self.max_concurrent_batches
        );

        let fetch = &fetch;
        let mut batches: Vec<(usize, Vec<Result<T, TaskFailure>>)> =
            stream::iter(tasks.chunks(self.batch_size).enumerate())
                .map(|(index, batch)| async move {
                    let results = join_all(batch.iter().map(|task| async move {
                        let result = fetch(task.clone()).await;
                        if let Err(err) = &result {
                            debug!("{} failed: {}", task, err);
                        }
                        progress.complete_one();
                        result
                    }))
                    .await;
                    (index, results)
                })
                .buffer_unordered(self.max_concurrent_batches)
                .collect()
                .await;

        batches.sort_by_key(|(index, _)| *index);
        batches.into_iter().flat_map(|(_, results)| results).collect()
    }
}
