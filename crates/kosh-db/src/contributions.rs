//! Contribution learning and promotion store.
//!
//! Human-submitted corrections accumulate usage counts; once a value has
//! been reused often enough it is promoted, exactly once, into the
//! canonical reference vocabulary. The whole increment-then-maybe-promote
//! sequence runs inside one transaction, serialized by the uniqueness
//! constraint on `(entity_type, normalized_value)`: concurrent
//! contributions of the same value cannot duplicate rows, lose an
//! increment, or double-promote.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use kosh_core::{
    defaults, new_v7, normalize_token, ContributedEntry, ContributionOutcome, EntityType, Error,
    NewContribution, Result, SuggestEntry,
};
use std::str::FromStr;
use tracing::{debug, info};

use crate::escape_like;

/// Repository trait for the contribution store.
#[async_trait]
pub trait ContributionRepository: Send + Sync {
    /// Record a contribution: create the entry with `usage_count = 1` or
    /// atomically increment it, promoting into the canonical vocabulary
    /// at the configured threshold.
    async fn contribute(&self, req: &NewContribution) -> Result<ContributionOutcome>;

    /// Canonical entries plus still-unpromoted contributions matching the
    /// query substring, ordered by usage count descending.
    async fn suggest(
        &self,
        entity_type: EntityType,
        query_prefix: &str,
        limit: i64,
    ) -> Result<Vec<SuggestEntry>>;

    /// Look up a contributed entry by its normalized value.
    async fn get(
        &self,
        entity_type: EntityType,
        normalized_value: &str,
    ) -> Result<Option<ContributedEntry>>;
}

/// PostgreSQL contribution repository.
pub struct PgContributionRepository {
    pool: Pool<Postgres>,
    promotion_threshold: i64,
}

impl PgContributionRepository {
    /// Create a repository with the default promotion threshold.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_promotion_threshold(pool, defaults::PROMOTION_THRESHOLD)
    }

    /// Create a repository with a custom promotion threshold.
    pub fn with_promotion_threshold(pool: Pool<Postgres>, promotion_threshold: i64) -> Self {
        Self {
            pool,
            promotion_threshold,
        }
    }

    /// The configured promotion threshold.
    pub fn promotion_threshold(&self) -> i64 {
        self.promotion_threshold
    }

    /// Transaction-aware contribute, composable with other writes (the
    /// ledger uses this for manual-entry reviews).
    pub async fn contribute_tx(
        tx: &mut Transaction<'_, Postgres>,
        req: &NewContribution,
        promotion_threshold: i64,
    ) -> Result<ContributionOutcome> {
        let normalized_value = normalize_token(&req.value_primary);
        if normalized_value.is_empty() {
            return Err(Error::InvalidInput(
                "contributed value normalizes to nothing".to_string(),
            ));
        }

        let aliases: Vec<String> = req
            .value_secondary
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        // Atomic upsert-and-increment; the unique constraint serializes
        // concurrent contributions of the same value.
        let row = sqlx::query(
            r#"
            INSERT INTO contributed_entry (
                id, entity_type, normalized_value, display_value_primary,
                display_value_secondary, aliases, usage_count, first_seen_at, promoted
            )
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, FALSE)
            ON CONFLICT (entity_type, normalized_value) DO UPDATE
                SET usage_count = contributed_entry.usage_count + 1
            RETURNING id, display_value_primary, aliases, usage_count, promoted
            "#,
        )
        .bind(new_v7())
        .bind(req.entity_type.as_str())
        .bind(&normalized_value)
        .bind(req.value_primary.trim())
        .bind(&req.value_secondary)
        .bind(&aliases)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let contribution_id: Uuid = row.get("id");
        let display_name: String = row.get("display_value_primary");
        let stored_aliases: Vec<String> = row.get("aliases");
        let usage_count: i64 = row.get("usage_count");
        let already_promoted: bool = row.get("promoted");

        let mut promoted = already_promoted;

        if usage_count >= promotion_threshold && !already_promoted {
            // Idempotent reference insert: a concurrent promotion that got
            // here first simply makes this a no-op.
            sqlx::query(
                r#"
                INSERT INTO reference_entry (
                    id, entity_type, canonical_key, display_name, aliases, category, created_at
                )
                VALUES ($1, $2, $3, $4, $5, 'contributed', $6)
                ON CONFLICT (entity_type, canonical_key) DO NOTHING
                "#,
            )
            .bind(new_v7())
            .bind(req.entity_type.as_str())
            .bind(&normalized_value)
            .bind(&display_name)
            .bind(&stored_aliases)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

            // One-way transition; zero rows affected means another
            // transaction promoted first, which is fine.
            let updated = sqlx::query(
                "UPDATE contributed_entry SET promoted = TRUE WHERE id = $1 AND NOT promoted",
            )
            .bind(contribution_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

            promoted = true;

            if updated.rows_affected() > 0 {
                info!(
                    subsystem = "db",
                    component = "contributions",
                    op = "promote",
                    entity_type = %req.entity_type,
                    canonical_key = %normalized_value,
                    usage_count,
                    "Contributed value promoted into canonical vocabulary"
                );
            }
        }

        Ok(ContributionOutcome {
            contribution_id,
            usage_count,
            promoted,
        })
    }
}

fn row_to_contributed(row: sqlx::postgres::PgRow) -> Result<ContributedEntry> {
    let entity_type: String = row.get("entity_type");
    Ok(ContributedEntry {
        id: row.get("id"),
        entity_type: EntityType::from_str(&entity_type)?,
        normalized_value: row.get("normalized_value"),
        display_value_primary: row.get("display_value_primary"),
        display_value_secondary: row.get("display_value_secondary"),
        aliases: row.get("aliases"),
        usage_count: row.get("usage_count"),
        first_seen_at: row.get("first_seen_at"),
        promoted: row.get("promoted"),
    })
}

#[async_trait]
impl ContributionRepository for PgContributionRepository {
    async fn contribute(&self, req: &NewContribution) -> Result<ContributionOutcome> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let outcome = Self::contribute_tx(&mut tx, req, self.promotion_threshold).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "contributions",
            op = "contribute",
            entity_type = %req.entity_type,
            mention_id = %req.source_mention_id,
            usage_count = outcome.usage_count,
            promoted = outcome.promoted,
            "Contribution recorded"
        );

        Ok(outcome)
    }

    async fn suggest(
        &self,
        entity_type: EntityType,
        query_prefix: &str,
        limit: i64,
    ) -> Result<Vec<SuggestEntry>> {
        let pattern = format!("%{}%", escape_like(query_prefix.trim()));

        let rows = sqlx::query(
            r#"
            SELECT key, display_name, aliases, usage_count, canonical
            FROM (
                SELECT r.canonical_key AS key,
                       r.display_name,
                       r.aliases,
                       COALESCE(c.usage_count, 0) AS usage_count,
                       TRUE AS canonical
                FROM reference_entry r
                LEFT JOIN contributed_entry c
                    ON c.entity_type = r.entity_type
                   AND c.normalized_value = r.canonical_key
                WHERE r.entity_type = $1
                  AND (r.display_name ILIKE $2
                       OR EXISTS (SELECT 1 FROM unnest(r.aliases) a WHERE a ILIKE $2))

                UNION ALL

                SELECT c.normalized_value AS key,
                       c.display_value_primary AS display_name,
                       c.aliases,
                       c.usage_count,
                       FALSE AS canonical
                FROM contributed_entry c
                WHERE c.entity_type = $1
                  AND NOT c.promoted
                  AND (c.display_value_primary ILIKE $2
                       OR c.display_value_secondary ILIKE $2
                       OR EXISTS (SELECT 1 FROM unnest(c.aliases) a WHERE a ILIKE $2))
            ) entries
            ORDER BY usage_count DESC, key
            LIMIT $3
            "#,
        )
        .bind(entity_type.as_str())
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| SuggestEntry {
                entity_type,
                key: row.get("key"),
                display_name: row.get("display_name"),
                aliases: row.get("aliases"),
                usage_count: row.get("usage_count"),
                canonical: row.get("canonical"),
            })
            .collect())
    }

    async fn get(
        &self,
        entity_type: EntityType,
        normalized_value: &str,
    ) -> Result<Option<ContributedEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, entity_type, normalized_value, display_value_primary,
                   display_value_secondary, aliases, usage_count, first_seen_at, promoted
            FROM contributed_entry
            WHERE entity_type = $1 AND normalized_value = $2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(normalized_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_contributed).transpose()
    }
}
