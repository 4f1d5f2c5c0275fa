//! Centralized default constants for the kosh resolution engine.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. When adding new constants, place them in the appropriate
//! section and document the rationale for the chosen value.

// =============================================================================
// DECISION POLICY
// =============================================================================

/// Single-candidate auto-accept floor in strict mode.
///
/// Strict deployments only auto-accept near-certain matches; everything
/// else goes to a reviewer.
pub const ACCEPT_THRESHOLD_STRICT: f32 = 0.98;

/// Single-candidate auto-accept floor in lenient mode.
///
/// Numerically equal to the keyword matcher's high-confidence band by
/// coincidence, not by contract; the two are configured independently.
pub const ACCEPT_THRESHOLD_LENIENT: f32 = 0.88;

// =============================================================================
// KEYWORD MATCHING
// =============================================================================

/// Base score for a keyword match with one piece of evidence.
pub const KEYWORD_SCORE_BASE: f32 = 0.45;

/// Score increment per additional piece of evidence.
pub const KEYWORD_SCORE_STEP: f32 = 0.25;

/// Upper bound on keyword scores; keyword evidence alone never reaches
/// certainty.
pub const KEYWORD_SCORE_CAP: f32 = 0.99;

/// Matches scoring below this floor are noise and discarded pre-ranking.
pub const KEYWORD_SCORE_FLOOR: f32 = 0.40;

// =============================================================================
// SIMILARITY SEARCH
// =============================================================================

/// Request timeout for the external similarity index, in milliseconds.
pub const SEARCH_TIMEOUT_MS: u64 = 5_000;

/// Neighbors requested per similarity query.
pub const SEARCH_LIMIT: usize = 8;

/// Default base URL of the similarity index service.
pub const SEARCH_URL: &str = "http://localhost:7700";

// =============================================================================
// LEARNING & PROMOTION
// =============================================================================

/// Contributions of the same value required before promotion into the
/// canonical vocabulary.
pub const PROMOTION_THRESHOLD: i64 = 3;

// =============================================================================
// READ PATHS
// =============================================================================

/// Default page size for suggest/autocomplete queries.
pub const SUGGEST_LIMIT: i64 = 10;

/// Default page size for the recent-reviews operational summary.
pub const RECENT_REVIEWS_LIMIT: i64 = 50;
