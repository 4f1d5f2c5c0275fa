//! # kosh-db
//!
//! PostgreSQL persistence layer for the kosh resolution engine.
//!
//! This crate provides:
//! - Connection pool management
//! - The append-only audit/review ledger
//! - The contribution learning and promotion store
//! - The canonical reference vocabulary, one namespace per entity type
//!
//! ## Example
//!
//! ```rust,ignore
//! use kosh_db::{ContributionRepository, Database};
//! use kosh_core::{EntityType, NewContribution};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/kosh").await?;
//!
//!     let outcome = db.contributions.contribute(&NewContribution {
//!         entity_type: EntityType::EventType,
//!         value_primary: "नया कार्यक्रम".to_string(),
//!         value_secondary: Some("New Event".to_string()),
//!         source_mention_id: Uuid::new_v4(),
//!     }).await?;
//!
//!     println!("usage count: {}", outcome.usage_count);
//!     Ok(())
//! }
//! ```

pub mod contributions;
pub mod ledger;
pub mod pool;
pub mod reference;

// Test fixtures for integration tests.
// Always compiled so integration tests (in tests/) can use
// DEFAULT_TEST_DATABASE_URL.
pub mod test_fixtures;

// Re-export core types
pub use kosh_core::*;

// Re-export repository implementations
pub use contributions::{ContributionRepository, PgContributionRepository};
pub use ledger::{LedgerRepository, PgLedgerRepository};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use reference::{PgReferenceRepository, ReferenceRepository};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Append-only audit/review ledger.
    pub ledger: PgLedgerRepository,
    /// Contribution learning and promotion store.
    pub contributions: PgContributionRepository,
    /// Canonical reference vocabulary.
    pub reference: PgReferenceRepository,
}

impl Database {
    /// Connect with default pool configuration and promotion threshold.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(
            database_url,
            PoolConfig::default(),
            defaults::PROMOTION_THRESHOLD,
        )
        .await
    }

    /// Connect with explicit pool configuration and promotion threshold.
    pub async fn connect_with(
        database_url: &str,
        pool_config: PoolConfig,
        promotion_threshold: i64,
    ) -> Result<Self> {
        let pool = create_pool_with_config(database_url, pool_config).await?;
        Ok(Self::from_pool(pool, promotion_threshold))
    }

    /// Build the repository bundle over an existing pool.
    pub fn from_pool(pool: sqlx::Pool<sqlx::Postgres>, promotion_threshold: i64) -> Self {
        Self {
            ledger: PgLedgerRepository::with_promotion_threshold(
                pool.clone(),
                promotion_threshold,
            ),
            contributions: PgContributionRepository::with_promotion_threshold(
                pool.clone(),
                promotion_threshold,
            ),
            reference: PgReferenceRepository::new(pool.clone()),
            pool,
        }
    }
}
