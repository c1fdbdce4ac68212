//! Hypernative REST client

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;

use super::models::{ApiEnvelope, CustomAgent, Monitor, ResultsPage, Suit, Watchlist};
use super::transport::{ApiRequest, Credentials, Transport, TransportSettings};
use super::{ApiResult, HypernativeApi};
use crate::error::{TaskFailure, TransportError};

/// Hypernative API client
pub struct HypernativeClient {
    transport: Transport,
}

impl HypernativeClient {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        settings: TransportSettings,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            transport: Transport::new(base_url, credentials, settings)?,
        })
    }

    async fn get_data<T: DeserializeOwned>(&self, path: String) -> ApiResult<T> {
        let body = self.transport.execute(&ApiRequest::get(path.as_str())).await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| TaskFailure::Decode(format!("{}: {}", path, e)))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl HypernativeApi for HypernativeClient {
    async fn list_suits(&self) -> ApiResult<Vec<Suit>> {
        let page: ResultsPage<Suit> = self.get_data("/security-suit/".to_string()).await?;
        debug!("Enumerated {} suits", page.results.len());
        Ok(page.results)
    }

    async fn get_watchlist(&self, id: &str) -> ApiResult<Watchlist> {
        self.get_data(format!("/watchlists/{}/", id)).await
    }

    async fn get_custom_agent(&self, id: &str) -> ApiResult<CustomAgent> {
        self.get_data(format!("/custom-agents/{}/", id)).await
    }

    async fn get_monitor(&self, id: &str) -> ApiResult<Monitor> {
        self.get_data(format!("/monitors/{}/", id)).await
    }
}
