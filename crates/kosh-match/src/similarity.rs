//! Similarity search client for the external vector index.
//!
//! The index itself (build, training, storage) is out of scope; this
//! client sends normalized mention text and a result-count limit, and maps
//! the ranked neighbors it gets back. Failures are not fatal: timeouts and
//! transport errors surface as [`Error::SearchUnavailable`], which the
//! provider chain degrades to an empty candidate set. There is no retry in
//! this component; retries, if needed, belong to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use kosh_core::{defaults, Error, IndexStats, Result, SimilarityHit};

/// Default base URL of the similarity index service.
pub const DEFAULT_SEARCH_URL: &str = defaults::SEARCH_URL;

/// Ranked nearest-neighbor lookup against the similarity index.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Return up to `limit` neighbors for the query, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SimilarityHit>>;

    /// Health snapshot of the index.
    async fn index_stats(&self) -> Result<IndexStats>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SimilarityHit>,
}

/// HTTP client for the similarity index service.
pub struct HttpSimilarityClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSimilarityClient {
    /// Create a client with an explicit base URL and request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Create from environment variables.
    ///
    /// `KOSH_SEARCH_URL` sets the base URL; `KOSH_SEARCH_TIMEOUT_MS` the
    /// request timeout.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("KOSH_SEARCH_URL").unwrap_or_else(|_| DEFAULT_SEARCH_URL.to_string());
        let timeout_ms = std::env::var("KOSH_SEARCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SEARCH_TIMEOUT_MS);

        Self::new(base_url, Duration::from_millis(timeout_ms))
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl SimilaritySearch for HttpSimilarityClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SimilarityHit>> {
        let start = Instant::now();
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, limit })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                subsystem = "match",
                component = "similarity",
                op = "search",
                status = response.status().as_u16(),
                "Similarity index returned non-success status"
            );
            return Err(Error::SearchUnavailable(format!(
                "similarity index returned {}",
                response.status()
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        debug!(
            subsystem = "match",
            component = "similarity",
            op = "search",
            result_count = payload.results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity search completed"
        );

        Ok(payload.results)
    }

    async fn index_stats(&self) -> Result<IndexStats> {
        let url = format!("{}/stats", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::SearchUnavailable(format!(
                "similarity index returned {}",
                response.status()
            )));
        }

        let stats: IndexStats = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(stats)
    }
}
