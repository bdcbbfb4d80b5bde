//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Kiwi.com Flights Search Client
//!
//! Effectful (time, network) operations: one GET per search request, through
//! RapidAPI, with a fixed timeout and no retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use weekender_query_queues::{QueryQueue, QueryQueueError};
use wreq::redirect::Policy;

use crate::flights_query_builder::SearchRequest;
use crate::weekends::Weekend;

pub const KIWI_API_HOST: &str = "kiwi-com-cheap-flights.p.rapidapi.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A failed search for one weekend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("search for weekend {weekend} failed: {kind}")]
pub struct NetworkError {
    pub weekend: Weekend,
    pub kind: NetworkErrorKind,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkErrorKind {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP error {status}: {body_preview}")]
    Status { status: u16, body_preview: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response is not valid JSON: {0}")]
    Decode(String),
}

/// Executes one search request.
#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn execute(&self, request: &SearchRequest) -> Result<Value, NetworkError>;
}

#[derive(Clone)]
pub struct KiwiFlightsClient {
    client: Arc<wreq::Client>,
    query_queue: QueryQueue,
    api_key: String,
    api_host: String,
}

impl KiwiFlightsClient {
    pub fn new(api_key: String, timeout_secs: u64, queries_per_second: u32) -> Result<Self> {
        let client = wreq::Client::builder()
            .redirect(Policy::default())
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        // One call in flight at a time, paced to the RapidAPI plan.
        let query_queue = QueryQueue::with_qps_limit(1, queries_per_second as u64);
        Ok(Self {
            client: Arc::new(client),
            query_queue,
            api_key,
            api_host: KIWI_API_HOST.to_string(),
        })
    }

    /// Point the client at another RapidAPI-compatible host.
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("https://{}/round-trip", self.api_host)
    }

    pub async fn fetch_raw(&self, url: &str) -> Result<String, NetworkErrorKind> {
        let client_inner = Arc::clone(&self.client);
        let api_key = self.api_key.clone();
        let api_host = self.api_host.clone();

        let queue_start = std::time::Instant::now();
        let response = self
            .query_queue
            .run(move || async move {
                let http_start = std::time::Instant::now();
                tracing::trace!("[fetch_raw] Starting HTTP request to: {}", url);
                let resp = client_inner
                    .get(url)
                    .header("X-RapidAPI-Key", &api_key)
                    .header("X-RapidAPI-Host", &api_host)
                    .send()
                    .await?;
                let status = resp.status();
                let body = resp.text().await?;
                tracing::trace!("[fetch_raw] HTTP request completed in {:?}", http_start.elapsed());
                Ok::<_, anyhow::Error>((status, body))
            })
            .await;
        tracing::debug!(
            "[fetch_raw] Query queue + HTTP execution time: {:?}",
            queue_start.elapsed()
        );

        let (status, body) = response.map_err(classify_failure)?;
        tracing::debug!(
            "[fetch_raw] HTTP Status: {} {}, {} KB",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            body.len() / 1024
        );

        if !status.is_success() {
            return Err(NetworkErrorKind::Status {
                status: status.as_u16(),
                body_preview: body.chars().take(300).collect(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl FlightSearch for KiwiFlightsClient {
    async fn execute(&self, request: &SearchRequest) -> Result<Value, NetworkError> {
        let url = request.get_search_url(&self.endpoint());
        tracing::info!("🔗 Searching weekend {}: {}", request.weekend, url);

        let fail = |kind| NetworkError {
            weekend: request.weekend,
            kind,
        };

        let body = self.fetch_raw(&url).await.map_err(fail)?;
        serde_json::from_str(&body).map_err(|e| fail(NetworkErrorKind::Decode(e.to_string())))
    }
}

fn classify_failure(err: QueryQueueError) -> NetworkErrorKind {
    match err {
        QueryQueueError::QueueClosed => NetworkErrorKind::Transport("query queue closed".into()),
        QueryQueueError::Failed(e) => match e.downcast_ref::<wreq::Error>() {
            Some(http_err) if http_err.is_timeout() => NetworkErrorKind::Timeout,
            _ => NetworkErrorKind::Transport(format!("{:#}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_queue_failures() {
        let closed = classify_failure(QueryQueueError::QueueClosed);
        assert!(matches!(closed, NetworkErrorKind::Transport(_)));

        let other = classify_failure(QueryQueueError::Failed(anyhow::anyhow!("connection reset")));
        match other {
            NetworkErrorKind::Transport(msg) => assert!(msg.contains("connection reset")),
            kind => panic!("unexpected kind: {:?}", kind),
        }
    }

    #[tokio::test]
    async fn test_endpoint() {
        let client = KiwiFlightsClient::new("key".into(), DEFAULT_TIMEOUT_SECS, 1)
            .unwrap()
            .with_api_host("example.test");
        assert_eq!(client.endpoint(), "https://example.test/round-trip");
    }
}
