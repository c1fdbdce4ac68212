//! Hypernative API client

use async_trait::async_trait;

use crate::error::TaskFailure;

pub mod hypernative;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod parallel;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use hypernative::HypernativeClient;
#[cfg(test)]
pub use mock::MockHypernativeApi;
pub use models::{CustomAgent, Monitor, Suit, Watchlist};
pub use parallel::{BatchScheduler, Progress, ProgressTracker};

/// Per-call result. Failures are scoped to the resource being fetched.
pub type ApiResult<T> = std::result::Result<T, TaskFailure>;

/// Hypernative API client trait
#[async_trait]
pub trait HypernativeApi: Send + Sync {
    /// List every security suit visible to the credentials
    async fn list_suits(&self) -> ApiResult<Vec<Suit>>;

    async fn get_watchlist(&self, id: &str) -> ApiResult<Watchlist>;

    async fn get_custom_agent(&self, id: &str) -> ApiResult<CustomAgent>;

    async fn get_monitor(&self, id: &str) -> ApiResult<Monitor>;
}
