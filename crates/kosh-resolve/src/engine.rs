//! The resolution service.
//!
//! Orchestrates one resolution request end to end: validate → normalize →
//! collect candidates through the provider chain → decide → record in the
//! audit ledger. Human review actions and vocabulary contributions pass
//! through here too, so the whole programmatic surface lives on one
//! service object with explicitly injected dependencies.
//!
//! All computation up to the provider call is pure; the provider call and
//! the ledger write are the only suspension points. Abandoning a request
//! at either point leaves no partial state behind, since the ledger insert is a
//! single statement.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use kosh_core::{
    defaults, is_blank, new_v7, normalize, CandidatePath, ContributionOutcome, EntityType, Error,
    IndexStats, Mention, NewContribution, NewReview, Result, ResolutionResult, ResolverConfig,
    ReviewRecord, SuggestEntry,
};
use kosh_db::{ContributionRepository, Database, LedgerRepository};
use kosh_match::{
    KeywordProvider, KeywordRuleSet, ProviderChain, SimilarityProvider, SimilaritySearch,
};

use crate::decision::{decide, DecisionPolicy};

/// The resolution service.
///
/// Construct once at startup with [`Resolver::new`] (or
/// [`Resolver::with_components`] for tests) and share across requests;
/// every dependency is behind an `Arc` and all per-request state is
/// local.
pub struct Resolver {
    ledger: Arc<dyn LedgerRepository>,
    contributions: Arc<dyn ContributionRepository>,
    similarity: Arc<dyn SimilaritySearch>,
    rules: Arc<KeywordRuleSet>,
    config: ResolverConfig,
    policy: DecisionPolicy,
}

impl Resolver {
    /// Build a resolver over a database bundle, the similarity client,
    /// and the built-in keyword rules.
    pub fn new(
        db: Database,
        similarity: Arc<dyn SimilaritySearch>,
        config: ResolverConfig,
    ) -> Self {
        let Database {
            ledger,
            contributions,
            ..
        } = db;
        Self::with_components(
            Arc::new(ledger),
            Arc::new(contributions),
            similarity,
            Arc::new(KeywordRuleSet::builtin()),
            config,
        )
    }

    /// Build a resolver from explicit components.
    pub fn with_components(
        ledger: Arc<dyn LedgerRepository>,
        contributions: Arc<dyn ContributionRepository>,
        similarity: Arc<dyn SimilaritySearch>,
        rules: Arc<KeywordRuleSet>,
        config: ResolverConfig,
    ) -> Self {
        let policy = DecisionPolicy::from_config(&config);
        Self {
            ledger,
            contributions,
            similarity,
            rules,
            config,
            policy,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a mention into a recorded [`ResolutionResult`].
    ///
    /// Blank mention text fails with [`Error::InvalidInput`] before any
    /// candidate retrieval. In strict mode, zero candidates fail with
    /// [`Error::NoCandidatesFound`]. A similarity-index outage is not an
    /// error: the provider chain degrades it to zero candidates.
    ///
    /// Ledger writes get one local retry; if the retry also fails, the
    /// computed result is still returned with `audited = false` so a
    /// transient write failure never discards a correct decision.
    pub async fn resolve(&self, mention: &Mention) -> Result<ResolutionResult> {
        let start = Instant::now();

        if is_blank(&mention.raw_text) {
            return Err(Error::InvalidInput(format!(
                "mention {} has blank text",
                mention.id
            )));
        }

        let context = normalize(&mention.raw_text);
        let strict_mode = self.config.resolved_strict_mode();

        let chain = self.provider_chain(mention.entity_type);
        let (mut candidates, source) = chain.fetch_first(mention, &context).await;
        sort_candidates(&mut candidates);

        let verdict = decide(mention.id, &candidates, strict_mode, &self.policy)?;

        let mut result = ResolutionResult {
            id: new_v7(),
            mention_id: mention.id,
            candidates,
            decision: verdict.decision,
            confidence: verdict.confidence,
            resolved_key: verdict.resolved_key,
            strict_mode,
            audited: true,
            created_at: Utc::now(),
        };

        result.audited = self.record_with_retry(&result).await;

        info!(
            subsystem = "resolve",
            component = "engine",
            op = "resolve",
            mention_id = %mention.id,
            entity_type = %mention.entity_type,
            decision = %result.decision,
            confidence = result.confidence,
            strict_mode,
            candidate_count = result.candidates.len(),
            provider = source.map(|s| s.as_str()).unwrap_or("none"),
            unaudited = !result.audited,
            duration_ms = start.elapsed().as_millis() as u64,
            "Mention resolved"
        );

        Ok(result)
    }

    /// Record a human review action.
    ///
    /// Contract violations (`UnknownMention`, `InvalidReview`) surface to
    /// the caller; a lost human decision is the worst failure mode this
    /// system has. Manual entries feed the contribution store atomically
    /// with the review record.
    pub async fn review(&self, review: NewReview) -> Result<ReviewRecord> {
        let record = self.ledger.record_review(review).await?;

        info!(
            subsystem = "resolve",
            component = "engine",
            op = "review",
            mention_id = %record.mention_id,
            reviewer_id = %record.reviewer_id,
            status = %record.review_status,
            "Review recorded"
        );

        Ok(record)
    }

    /// Record a vocabulary contribution, promoting at the configured
    /// threshold.
    pub async fn contribute(&self, req: &NewContribution) -> Result<ContributionOutcome> {
        self.contributions.contribute(req).await
    }

    /// Autocomplete read path: canonical plus still-unpromoted entries
    /// matching the query substring.
    pub async fn suggest(
        &self,
        entity_type: EntityType,
        query_prefix: &str,
    ) -> Result<Vec<SuggestEntry>> {
        self.contributions
            .suggest(entity_type, query_prefix, defaults::SUGGEST_LIMIT)
            .await
    }

    /// Recent review records for operational summaries.
    pub async fn recent_reviews(&self, limit: i64) -> Result<Vec<ReviewRecord>> {
        self.ledger.recent_reviews(limit).await
    }

    /// Health snapshot of the external similarity index.
    ///
    /// Unlike [`Resolver::resolve`], an unreachable index surfaces here
    /// as [`Error::SearchUnavailable`], since this is a direct index query.
    pub async fn index_health(&self) -> Result<IndexStats> {
        self.similarity.index_stats().await
    }

    fn provider_chain(&self, entity_type: EntityType) -> ProviderChain {
        ProviderChain::for_entity_type(
            entity_type,
            Arc::new(SimilarityProvider::new(
                self.similarity.clone(),
                self.config.search_limit,
                self.config.search_timeout,
            )),
            Arc::new(KeywordProvider::new(self.rules.clone())),
        )
    }

    /// One local retry on ledger failure; returns whether the write
    /// landed.
    async fn record_with_retry(&self, result: &ResolutionResult) -> bool {
        match self.ledger.record_resolution(result).await {
            Ok(_) => true,
            Err(first) => {
                warn!(
                    subsystem = "resolve",
                    component = "engine",
                    op = "record_resolution",
                    mention_id = %result.mention_id,
                    error = %first,
                    "Ledger write failed, retrying once"
                );
                match self.ledger.record_resolution(result).await {
                    Ok(_) => true,
                    Err(second) => {
                        error!(
                            subsystem = "resolve",
                            component = "engine",
                            op = "record_resolution",
                            mention_id = %result.mention_id,
                            error = %second,
                            unaudited = true,
                            "Ledger write failed after retry; returning unaudited result"
                        );
                        false
                    }
                }
            }
        }
    }
}

/// Re-sort merged provider output: score descending, ties broken by key
/// for stable, language-neutral ordering.
fn sort_candidates(candidates: &mut [CandidatePath]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key().cmp(&b.key()))
    });
}

/// Convenience constructor wiring the standard production components.
pub async fn resolver_from_env(database_url: &str) -> Result<Resolver> {
    let config = ResolverConfig::from_env()?;
    let db = Database::connect_with(
        database_url,
        kosh_db::PoolConfig::default(),
        config.promotion_threshold,
    )
    .await?;
    let similarity: Arc<dyn SimilaritySearch> =
        Arc::new(kosh_match::HttpSimilarityClient::from_env()?);
    Ok(Resolver::new(db, similarity, config))
}
