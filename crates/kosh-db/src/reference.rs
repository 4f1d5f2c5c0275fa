//! Canonical reference vocabulary.
//!
//! One namespace per entity type, discriminated by the `entity_type`
//! column. Inserts are idempotent on `(entity_type, canonical_key)`:
//! promotion and vocabulary seeding can both run repeatedly without
//! duplicating entries.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use kosh_core::{new_v7, EntityType, Error, NewReferenceEntry, ReferenceEntry, Result};
use std::str::FromStr;

/// Repository trait for the canonical vocabulary.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Idempotent insert; returns the id of the existing or new entry.
    async fn insert(&self, entry: &NewReferenceEntry) -> Result<Uuid>;

    /// Look up an entry by canonical key.
    async fn get(&self, entity_type: EntityType, canonical_key: &str)
        -> Result<Option<ReferenceEntry>>;

    /// All entries for an entity type, ordered by canonical key.
    async fn list(&self, entity_type: EntityType) -> Result<Vec<ReferenceEntry>>;
}

/// PostgreSQL reference vocabulary repository.
pub struct PgReferenceRepository {
    pool: Pool<Postgres>,
}

impl PgReferenceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: sqlx::postgres::PgRow) -> Result<ReferenceEntry> {
    let entity_type: String = row.get("entity_type");
    Ok(ReferenceEntry {
        id: row.get("id"),
        entity_type: EntityType::from_str(&entity_type)?,
        canonical_key: row.get("canonical_key"),
        display_name: row.get("display_name"),
        aliases: row.get("aliases"),
        category: row.get("category"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl ReferenceRepository for PgReferenceRepository {
    async fn insert(&self, entry: &NewReferenceEntry) -> Result<Uuid> {
        if entry.canonical_key.trim().is_empty() {
            return Err(Error::InvalidInput(
                "canonical key cannot be empty".to_string(),
            ));
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO reference_entry (
                id, entity_type, canonical_key, display_name, aliases, category, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (entity_type, canonical_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(new_v7())
        .bind(entry.entity_type.as_str())
        .bind(&entry.canonical_key)
        .bind(&entry.display_name)
        .bind(&entry.aliases)
        .bind(&entry.category)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(id) = inserted {
            return Ok(id);
        }

        // Conflict path: the entry already exists, return its id.
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM reference_entry WHERE entity_type = $1 AND canonical_key = $2",
        )
        .bind(entry.entity_type.as_str())
        .bind(&entry.canonical_key)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(existing)
    }

    async fn get(
        &self,
        entity_type: EntityType,
        canonical_key: &str,
    ) -> Result<Option<ReferenceEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, entity_type, canonical_key, display_name, aliases, category, created_at
            FROM reference_entry
            WHERE entity_type = $1 AND canonical_key = $2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(canonical_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_entry).transpose()
    }

    async fn list(&self, entity_type: EntityType) -> Result<Vec<ReferenceEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, entity_type, canonical_key, display_name, aliases, category, created_at
            FROM reference_entry
            WHERE entity_type = $1
            ORDER BY canonical_key
            "#,
        )
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_entry).collect()
    }
}
