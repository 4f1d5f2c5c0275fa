//! Mock similarity client for deterministic testing.
//!
//! Supports fixed hits per query, a default hit list, forced failure, and
//! a call log for asserting on interaction order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kosh_core::{Error, IndexStats, Result, SimilarityHit};

use crate::similarity::SimilaritySearch;

#[derive(Debug, Clone, Default)]
struct MockConfig {
    hits_by_query: HashMap<String, Vec<SimilarityHit>>,
    default_hits: Vec<SimilarityHit>,
    fail: bool,
    delay: Option<Duration>,
    stats: Option<IndexStats>,
}

/// Deterministic in-memory stand-in for the similarity index.
#[derive(Clone, Default)]
pub struct MockSimilarityClient {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
}

impl MockSimilarityClient {
    /// Mock with no configured hits: every query returns empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the hits returned for one exact query string.
    pub fn with_hits(mut self, query: impl Into<String>, hits: Vec<SimilarityHit>) -> Self {
        Arc::make_mut(&mut self.config)
            .hits_by_query
            .insert(query.into(), hits);
        self
    }

    /// Hits returned for any query without a specific mapping.
    pub fn with_default_hits(mut self, hits: Vec<SimilarityHit>) -> Self {
        Arc::make_mut(&mut self.config).default_hits = hits;
        self
    }

    /// Make every call fail with `SearchUnavailable`, simulating a
    /// timed-out or dead index.
    pub fn failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Sleep this long before answering, simulating a slow index.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.config).delay = Some(delay);
        self
    }

    /// Fix the stats snapshot.
    pub fn with_stats(mut self, stats: IndexStats) -> Self {
        Arc::make_mut(&mut self.config).stats = Some(stats);
        self
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().expect("call log poisoned").clone()
    }
}

#[async_trait]
impl SimilaritySearch for MockSimilarityClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SimilarityHit>> {
        self.call_log
            .lock()
            .expect("call log poisoned")
            .push(query.to_string());

        if let Some(delay) = self.config.delay {
            tokio::time::sleep(delay).await;
        }

        if self.config.fail {
            return Err(Error::SearchUnavailable("mock index offline".to_string()));
        }

        let hits = self
            .config
            .hits_by_query
            .get(query)
            .unwrap_or(&self.config.default_hits);

        Ok(hits.iter().take(limit).cloned().collect())
    }

    async fn index_stats(&self) -> Result<IndexStats> {
        if self.config.fail {
            return Err(Error::SearchUnavailable("mock index offline".to_string()));
        }
        Ok(self.config.stats.unwrap_or(IndexStats {
            count: 0,
            dimension: 0,
        }))
    }
}
