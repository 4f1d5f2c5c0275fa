//! In-memory test doubles for resolver integration tests.
//!
//! The persistence contract itself is covered by the kosh-db integration
//! tests against PostgreSQL; these fakes let the resolver's orchestration
//! be exercised hermetically.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use kosh_core::{
    is_blank, new_v7, normalize_token, ContributedEntry, ContributionOutcome, EntityType, Error,
    Mention, NewContribution, NewReview, Result, ResolutionResult, ReviewRecord, ReviewStatus,
    SuggestEntry,
};
use kosh_db::{ContributionRepository, LedgerRepository};

/// Initialize test logging once; safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a mention for tests.
pub fn mention(entity_type: EntityType, raw_text: &str) -> Mention {
    Mention {
        id: Uuid::new_v4(),
        raw_text: raw_text.to_string(),
        entity_type,
        source_id: "post_42".to_string(),
        extracted_at: Utc::now(),
    }
}

/// Append-only in-memory ledger with an injectable failure budget.
#[derive(Default)]
pub struct InMemoryLedger {
    resolutions: Mutex<Vec<ResolutionResult>>,
    reviews: Mutex<Vec<ReviewRecord>>,
    fail_next_records: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` record_resolution calls fail.
    pub fn fail_next_records(&self, n: usize) {
        self.fail_next_records.store(n, Ordering::SeqCst);
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.lock().unwrap().len()
    }

    pub fn resolutions_for(&self, mention_id: Uuid) -> Vec<ResolutionResult> {
        self.resolutions
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.mention_id == mention_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn record_resolution(&self, result: &ResolutionResult) -> Result<Uuid> {
        let remaining = self.fail_next_records.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_records.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Internal("simulated ledger outage".to_string()));
        }

        self.resolutions.lock().unwrap().push(result.clone());
        Ok(result.id)
    }

    async fn has_resolution(&self, mention_id: Uuid) -> Result<bool> {
        Ok(self
            .resolutions
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.mention_id == mention_id))
    }

    async fn latest_resolution(&self, mention_id: Uuid) -> Result<Option<ResolutionResult>> {
        Ok(self
            .resolutions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.mention_id == mention_id)
            .cloned())
    }

    async fn record_review(&self, review: NewReview) -> Result<ReviewRecord> {
        match review.status {
            ReviewStatus::Confirmed if review.chosen_candidate_key.is_none() => {
                return Err(Error::InvalidReview(
                    "confirmed review requires a chosen candidate key".to_string(),
                ));
            }
            ReviewStatus::ManualEntry
                if review.manual_value.as_deref().map(is_blank).unwrap_or(true) =>
            {
                return Err(Error::InvalidReview(
                    "manual entry review requires a manual value".to_string(),
                ));
            }
            _ => {}
        }

        if !self.has_resolution(review.mention_id).await? {
            return Err(Error::UnknownMention(review.mention_id));
        }

        let record = ReviewRecord {
            id: new_v7(),
            mention_id: review.mention_id,
            chosen_candidate_key: review.chosen_candidate_key,
            manual_value: review.manual_value,
            reviewer_id: review.reviewer_id,
            review_status: review.status,
            decided_at: Utc::now(),
        };
        self.reviews.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<ReviewRecord>> {
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews.iter().rev().take(limit as usize).cloned().collect())
    }
}

struct StoredContribution {
    id: Uuid,
    display: String,
    usage_count: i64,
    promoted: bool,
}

/// In-memory contribution store mirroring the promotion semantics.
pub struct InMemoryContributions {
    threshold: i64,
    entries: Mutex<HashMap<(EntityType, String), StoredContribution>>,
}

impl InMemoryContributions {
    pub fn new(threshold: i64) -> Arc<Self> {
        Arc::new(Self {
            threshold,
            entries: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl ContributionRepository for InMemoryContributions {
    async fn contribute(&self, req: &NewContribution) -> Result<ContributionOutcome> {
        let key = normalize_token(&req.value_primary);
        if key.is_empty() {
            return Err(Error::InvalidInput(
                "contributed value normalizes to nothing".to_string(),
            ));
        }

        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry((req.entity_type, key))
            .and_modify(|e| e.usage_count += 1)
            .or_insert_with(|| StoredContribution {
                id: new_v7(),
                display: req.value_primary.trim().to_string(),
                usage_count: 1,
                promoted: false,
            });

        if entry.usage_count >= self.threshold {
            entry.promoted = true;
        }

        Ok(ContributionOutcome {
            contribution_id: entry.id,
            usage_count: entry.usage_count,
            promoted: entry.promoted,
        })
    }

    async fn suggest(
        &self,
        entity_type: EntityType,
        query_prefix: &str,
        limit: i64,
    ) -> Result<Vec<SuggestEntry>> {
        let needle = query_prefix.to_lowercase();
        let entries = self.entries.lock().unwrap();

        let mut matches: Vec<SuggestEntry> = entries
            .iter()
            .filter(|((et, _), entry)| {
                *et == entity_type && entry.display.to_lowercase().contains(&needle)
            })
            .map(|((_, key), entry)| SuggestEntry {
                entity_type,
                key: key.clone(),
                display_name: entry.display.clone(),
                aliases: Vec::new(),
                usage_count: entry.usage_count,
                canonical: entry.promoted,
            })
            .collect();

        matches.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.key.cmp(&b.key)));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn get(
        &self,
        entity_type: EntityType,
        normalized_value: &str,
    ) -> Result<Option<ContributedEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(&(entity_type, normalized_value.to_string()))
            .map(|entry| ContributedEntry {
                id: entry.id,
                entity_type,
                normalized_value: normalized_value.to_string(),
                display_value_primary: entry.display.clone(),
                display_value_secondary: None,
                aliases: Vec::new(),
                usage_count: entry.usage_count,
                first_seen_at: Utc::now(),
                promoted: entry.promoted,
            }))
    }
}
