//! Append-only audit/review ledger.
//!
//! Every resolution outcome and every human review action lands here.
//! Resolution rows are never overwritten; re-resolving a mention inserts
//! a new row. Review records are append-only too: a correction is a new
//! record, not an edit. A lost human decision is the worst failure mode
//! this system has, so contract violations (`UnknownMention`,
//! `InvalidReview`) are always surfaced, never dropped.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use kosh_core::{
    defaults, is_blank, new_v7, CandidatePath, Decision, Error, NewContribution, NewReview,
    Result, ResolutionResult, ReviewRecord, ReviewStatus,
};
use std::str::FromStr;
use tracing::debug;

use crate::contributions::PgContributionRepository;

/// Repository trait for ledger operations.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Persist a resolution result. Always inserts a new row; never
    /// overwrites a prior result for the same mention.
    async fn record_resolution(&self, result: &ResolutionResult) -> Result<Uuid>;

    /// Whether any resolution attempt exists for the mention.
    async fn has_resolution(&self, mention_id: Uuid) -> Result<bool>;

    /// Most recent resolution attempt for the mention, if any.
    async fn latest_resolution(&self, mention_id: Uuid) -> Result<Option<ResolutionResult>>;

    /// Persist a human review action.
    ///
    /// Fails with [`Error::UnknownMention`] when the mention has no prior
    /// resolution, and [`Error::InvalidReview`] when the status/payload
    /// combination violates the ledger contract. A `ManualEntry` review
    /// records the contribution in the same transaction.
    async fn record_review(&self, review: NewReview) -> Result<ReviewRecord>;

    /// Recent review records, newest decision first. Read path for
    /// operational summaries only.
    async fn recent_reviews(&self, limit: i64) -> Result<Vec<ReviewRecord>>;
}

/// PostgreSQL ledger repository.
pub struct PgLedgerRepository {
    pool: Pool<Postgres>,
    promotion_threshold: i64,
}

impl PgLedgerRepository {
    /// Create a ledger with the default promotion threshold.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_promotion_threshold(pool, defaults::PROMOTION_THRESHOLD)
    }

    /// Create a ledger with a custom promotion threshold for the
    /// manual-entry contribution path.
    pub fn with_promotion_threshold(pool: Pool<Postgres>, promotion_threshold: i64) -> Self {
        Self {
            pool,
            promotion_threshold,
        }
    }
}

/// Reject status/payload combinations the ledger contract forbids.
fn validate_review(review: &NewReview) -> Result<()> {
    match review.status {
        ReviewStatus::Confirmed => {
            if review.chosen_candidate_key.is_none() {
                return Err(Error::InvalidReview(
                    "confirmed review requires a chosen candidate key".to_string(),
                ));
            }
        }
        ReviewStatus::ManualEntry => {
            let blank = review
                .manual_value
                .as_deref()
                .map(is_blank)
                .unwrap_or(true);
            if blank {
                return Err(Error::InvalidReview(
                    "manual entry review requires a manual value".to_string(),
                ));
            }
        }
        ReviewStatus::Rejected | ReviewStatus::Skipped => {}
    }
    Ok(())
}

fn row_to_review(row: sqlx::postgres::PgRow) -> Result<ReviewRecord> {
    let status: String = row.get("review_status");
    Ok(ReviewRecord {
        id: row.get("id"),
        mention_id: row.get("mention_id"),
        chosen_candidate_key: row.get("chosen_candidate_key"),
        manual_value: row.get("manual_value"),
        reviewer_id: row.get("reviewer_id"),
        review_status: ReviewStatus::from_str(&status)?,
        decided_at: row.get("decided_at"),
    })
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn record_resolution(&self, result: &ResolutionResult) -> Result<Uuid> {
        let candidates = serde_json::to_value(&result.candidates)?;

        sqlx::query(
            r#"
            INSERT INTO resolution_result (
                id, mention_id, candidates, decision, confidence,
                resolved_key, strict_mode, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(result.id)
        .bind(result.mention_id)
        .bind(&candidates)
        .bind(result.decision.as_str())
        .bind(result.confidence)
        .bind(&result.resolved_key)
        .bind(result.strict_mode)
        .bind(result.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.id)
    }

    async fn has_resolution(&self, mention_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM resolution_result WHERE mention_id = $1)",
        )
        .bind(mention_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn latest_resolution(&self, mention_id: Uuid) -> Result<Option<ResolutionResult>> {
        let row = sqlx::query(
            r#"
            SELECT id, mention_id, candidates, decision, confidence,
                   resolved_key, strict_mode, created_at
            FROM resolution_result
            WHERE mention_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(mention_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decision: String = row.get("decision");
        let candidates: serde_json::Value = row.get("candidates");
        let candidates: Vec<CandidatePath> = serde_json::from_value(candidates)?;

        Ok(Some(ResolutionResult {
            id: row.get("id"),
            mention_id: row.get("mention_id"),
            candidates,
            decision: Decision::from_str(&decision)?,
            confidence: row.get("confidence"),
            resolved_key: row.get("resolved_key"),
            strict_mode: row.get("strict_mode"),
            audited: true,
            created_at: row.get("created_at"),
        }))
    }

    async fn record_review(&self, review: NewReview) -> Result<ReviewRecord> {
        validate_review(&review)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM resolution_result WHERE mention_id = $1)",
        )
        .bind(review.mention_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if !exists {
            return Err(Error::UnknownMention(review.mention_id));
        }

        let id = new_v7();
        let decided_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO review_record (
                id, mention_id, chosen_candidate_key, manual_value,
                reviewer_id, review_status, decided_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(review.mention_id)
        .bind(&review.chosen_candidate_key)
        .bind(&review.manual_value)
        .bind(&review.reviewer_id)
        .bind(review.status.as_str())
        .bind(decided_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // A manual entry feeds the learning loop in the same transaction:
        // the review record and its contribution commit or roll back
        // together.
        if review.status == ReviewStatus::ManualEntry {
            let manual_value = review
                .manual_value
                .clone()
                .ok_or_else(|| Error::InvalidReview("manual value missing".to_string()))?;

            let contribution = NewContribution {
                entity_type: review.entity_type,
                value_primary: manual_value,
                value_secondary: None,
                source_mention_id: review.mention_id,
            };

            let outcome = PgContributionRepository::contribute_tx(
                &mut tx,
                &contribution,
                self.promotion_threshold,
            )
            .await?;

            debug!(
                subsystem = "db",
                component = "ledger",
                op = "record_review",
                mention_id = %review.mention_id,
                usage_count = outcome.usage_count,
                promoted = outcome.promoted,
                "Manual entry recorded as contribution"
            );
        }

        tx.commit().await.map_err(Error::Database)?;

        Ok(ReviewRecord {
            id,
            mention_id: review.mention_id,
            chosen_candidate_key: review.chosen_candidate_key,
            manual_value: review.manual_value,
            reviewer_id: review.reviewer_id,
            review_status: review.status,
            decided_at,
        })
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<ReviewRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, mention_id, chosen_candidate_key, manual_value,
                   reviewer_id, review_status, decided_at
            FROM review_record
            ORDER BY decided_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_review).collect()
    }
}
