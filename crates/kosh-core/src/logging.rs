//! Structured logging schema and field name constants for kosh.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (candidates, hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "resolve", "match", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "engine", "provider_chain", "similarity", "ledger", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "review", "contribute", "suggest", "search"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Mention UUID being resolved or reviewed.
pub const MENTION_ID: &str = "mention_id";

/// Entity type of the mention ("location", "event_type", ...).
pub const ENTITY_TYPE: &str = "entity_type";

/// Reviewer identifier on ledger writes.
pub const REVIEWER_ID: &str = "reviewer_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates after merge and dedup.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of results returned by a provider or query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Decision fields ───────────────────────────────────────────────────────

/// Terminal decision of a resolution attempt.
pub const DECISION: &str = "decision";

/// Top candidate score carried into the result.
pub const CONFIDENCE: &str = "confidence";

/// Whether strict mode governed the decision.
pub const STRICT_MODE: &str = "strict_mode";

/// Provider that produced the winning candidate set.
pub const PROVIDER: &str = "provider";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Set when a resolution result could not be written to the ledger.
pub const UNAUDITED: &str = "unaudited";
