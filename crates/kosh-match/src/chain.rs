//! Ordered provider chain.
//!
//! Fallback between match strategies is an explicit, testable contract:
//! providers are consulted in order until the first non-empty result.
//! A provider failure is logged and treated as an empty result: the
//! chain degrades, it never propagates upstream-search errors.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use kosh_core::{
    collect_candidates, CandidateInput, CandidatePath, CandidateSource, EntityType, Error,
    Mention, Result,
};

use crate::keyword::KeywordRuleSet;
use crate::similarity::SimilaritySearch;

/// A ranked-candidate strategy consulted by the chain.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Tag recorded on candidates this provider produces.
    fn source(&self) -> CandidateSource;

    /// Rank candidates for the mention. `context` is the normalized
    /// mention text.
    async fn fetch(&self, mention: &Mention, context: &str) -> Result<Vec<CandidatePath>>;
}

/// Provider backed by the external similarity index.
///
/// Applies its own bound around every search call: even a client that
/// never gives up is cut off after `timeout` and treated like any other
/// index outage.
pub struct SimilarityProvider {
    client: Arc<dyn SimilaritySearch>,
    limit: usize,
    timeout: Duration,
}

impl SimilarityProvider {
    pub fn new(client: Arc<dyn SimilaritySearch>, limit: usize, timeout: Duration) -> Self {
        Self {
            client,
            limit,
            timeout,
        }
    }
}

#[async_trait]
impl CandidateProvider for SimilarityProvider {
    fn source(&self) -> CandidateSource {
        CandidateSource::Similarity
    }

    async fn fetch(&self, _mention: &Mention, context: &str) -> Result<Vec<CandidatePath>> {
        let hits = tokio::time::timeout(self.timeout, self.client.search(context, self.limit))
            .await
            .map_err(|_| {
                Error::SearchUnavailable(format!(
                    "similarity search exceeded {} ms",
                    self.timeout.as_millis()
                ))
            })??;

        let inputs = hits
            .into_iter()
            .map(|hit| CandidateInput::hierarchy(hit.key, hit.score, CandidateSource::Similarity))
            .collect();
        Ok(collect_candidates(inputs))
    }
}

/// Provider backed by the keyword rule registry.
pub struct KeywordProvider {
    rules: Arc<KeywordRuleSet>,
}

impl KeywordProvider {
    pub fn new(rules: Arc<KeywordRuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl CandidateProvider for KeywordProvider {
    fn source(&self) -> CandidateSource {
        CandidateSource::Keyword
    }

    async fn fetch(&self, mention: &Mention, context: &str) -> Result<Vec<CandidatePath>> {
        let inputs = self
            .rules
            .match_mention(mention.entity_type, context)
            .into_iter()
            .map(|m| CandidateInput::hierarchy(m.key, m.score, CandidateSource::Keyword))
            .collect();
        Ok(collect_candidates(inputs))
    }
}

/// Explicit ordered chain of candidate providers.
pub struct ProviderChain {
    providers: Vec<Arc<dyn CandidateProvider>>,
}

impl ProviderChain {
    /// Chain with an explicit provider order.
    pub fn new(providers: Vec<Arc<dyn CandidateProvider>>) -> Self {
        Self { providers }
    }

    /// Standard routing for an entity type.
    ///
    /// Event categories and scheme names have curated bilingual rule
    /// tables, so the keyword matcher goes first for those; everything
    /// else consults the similarity index first.
    pub fn for_entity_type(
        entity_type: EntityType,
        similarity: Arc<dyn CandidateProvider>,
        keyword: Arc<dyn CandidateProvider>,
    ) -> Self {
        let providers = match entity_type {
            EntityType::EventType | EntityType::Scheme => vec![keyword, similarity],
            EntityType::Location | EntityType::Person | EntityType::Organization => {
                vec![similarity, keyword]
            }
        };
        Self::new(providers)
    }

    /// Consult providers in order; return the first non-empty candidate
    /// set with its source. Provider errors degrade to empty (logged at
    /// WARN), so a dead similarity index means "zero candidates", never a
    /// resolution failure.
    pub async fn fetch_first(
        &self,
        mention: &Mention,
        context: &str,
    ) -> (Vec<CandidatePath>, Option<CandidateSource>) {
        for provider in &self.providers {
            match provider.fetch(mention, context).await {
                Ok(candidates) if !candidates.is_empty() => {
                    debug!(
                        subsystem = "match",
                        component = "provider_chain",
                        op = "fetch",
                        mention_id = %mention.id,
                        provider = %provider.source(),
                        result_count = candidates.len(),
                        "Provider produced candidates"
                    );
                    return (candidates, Some(provider.source()));
                }
                Ok(_) => {
                    debug!(
                        subsystem = "match",
                        component = "provider_chain",
                        op = "fetch",
                        mention_id = %mention.id,
                        provider = %provider.source(),
                        "Provider returned no candidates, trying next"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "match",
                        component = "provider_chain",
                        op = "fetch",
                        mention_id = %mention.id,
                        provider = %provider.source(),
                        error = %e,
                        "Provider failed, degrading to empty result"
                    );
                }
            }
        }

        (Vec::new(), None)
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSimilarityClient;
    use chrono::Utc;
    use kosh_core::SimilarityHit;
    use uuid::Uuid;

    fn mention(entity_type: EntityType, raw: &str) -> Mention {
        Mention {
            id: Uuid::new_v4(),
            raw_text: raw.to_string(),
            entity_type,
            source_id: "post_1".to_string(),
            extracted_at: Utc::now(),
        }
    }

    fn similarity_provider(client: MockSimilarityClient) -> Arc<dyn CandidateProvider> {
        Arc::new(SimilarityProvider::new(
            Arc::new(client),
            5,
            Duration::from_millis(500),
        ))
    }

    fn keyword_provider() -> Arc<dyn CandidateProvider> {
        Arc::new(KeywordProvider::new(Arc::new(KeywordRuleSet::builtin())))
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let client = MockSimilarityClient::new().with_hits(
            "raigarh",
            vec![SimilarityHit {
                key: "chhattisgarh > raigarh".into(),
                score: 0.92,
            }],
        );
        let chain = ProviderChain::new(vec![similarity_provider(client), keyword_provider()]);
        let m = mention(EntityType::Location, "Raigarh");

        let (candidates, source) = chain.fetch_first(&m, "raigarh").await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(source, Some(CandidateSource::Similarity));
    }

    #[tokio::test]
    async fn test_falls_through_on_empty() {
        let client = MockSimilarityClient::new(); // no hits configured
        let chain = ProviderChain::new(vec![similarity_provider(client), keyword_provider()]);
        let m = mention(EntityType::EventType, "flood in ward 3");

        let (candidates, source) = chain.fetch_first(&m, "flood in ward 3").await;
        assert_eq!(source, Some(CandidateSource::Keyword));
        assert_eq!(candidates[0].key(), "flood");
    }

    #[tokio::test]
    async fn test_slow_index_is_cut_off_by_the_provider_bound() {
        // The mock answers after 200ms but the provider allows 20ms; the
        // chain falls through to the keyword matcher.
        let client = MockSimilarityClient::new()
            .with_delay(Duration::from_millis(200))
            .with_default_hits(vec![SimilarityHit {
                key: "too late".into(),
                score: 0.99,
            }]);
        let slow: Arc<dyn CandidateProvider> = Arc::new(SimilarityProvider::new(
            Arc::new(client),
            5,
            Duration::from_millis(20),
        ));
        let chain = ProviderChain::new(vec![slow, keyword_provider()]);
        let m = mention(EntityType::EventType, "flood in ward 3");

        let (candidates, source) = chain.fetch_first(&m, "flood in ward 3").await;
        assert_eq!(source, Some(CandidateSource::Keyword));
        assert_eq!(candidates[0].key(), "flood");
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_next() {
        let client = MockSimilarityClient::new().failing();
        let chain = ProviderChain::new(vec![similarity_provider(client), keyword_provider()]);
        let m = mention(EntityType::EventType, "flood in ward 3");

        let (candidates, source) = chain.fetch_first(&m, "flood in ward 3").await;
        assert_eq!(source, Some(CandidateSource::Keyword));
        assert!(!candidates.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_empty_not_error() {
        let client = MockSimilarityClient::new().failing();
        let chain = ProviderChain::new(vec![similarity_provider(client)]);
        let m = mention(EntityType::Location, "unknown place");

        let (candidates, source) = chain.fetch_first(&m, "unknown place").await;
        assert!(candidates.is_empty());
        assert_eq!(source, None);
    }

    #[test]
    fn test_routing_order_by_entity_type() {
        let sim = similarity_provider(MockSimilarityClient::new());
        let kw = keyword_provider();

        let chain = ProviderChain::for_entity_type(EntityType::EventType, sim.clone(), kw.clone());
        assert_eq!(chain.providers[0].source(), CandidateSource::Keyword);

        let chain = ProviderChain::for_entity_type(EntityType::Location, sim, kw);
        assert_eq!(chain.providers[0].source(), CandidateSource::Similarity);
    }
}
