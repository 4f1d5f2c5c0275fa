//! Domain models for mention resolution, review, and vocabulary learning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Delimiter joining normalized tokens into a candidate's dedup/display key.
pub const PATH_DELIMITER: &str = " > ";

/// Kind of entity a mention refers to.
///
/// Stored as text in the database; one canonical vocabulary namespace
/// exists per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Location,
    EventType,
    Scheme,
    Person,
    Organization,
}

impl EntityType {
    /// All entity types, in a stable order.
    pub const ALL: [EntityType; 5] = [
        EntityType::Location,
        EntityType::EventType,
        EntityType::Scheme,
        EntityType::Person,
        EntityType::Organization,
    ];

    /// Text form used in the database and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Location => "location",
            EntityType::EventType => "event_type",
            EntityType::Scheme => "scheme",
            EntityType::Person => "person",
            EntityType::Organization => "organization",
        }
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" => Ok(EntityType::Location),
            "event_type" => Ok(EntityType::EventType),
            "scheme" => Ok(EntityType::Scheme),
            "person" => Ok(EntityType::Person),
            "organization" => Ok(EntityType::Organization),
            other => Err(Error::InvalidInput(format!(
                "unknown entity type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw, unresolved entity reference extracted from source text.
///
/// Produced by the upstream extraction step; immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: Uuid,
    /// Free text as extracted, untouched.
    pub raw_text: String,
    pub entity_type: EntityType,
    /// Identifier of the source post the mention came from.
    pub source_id: String,
    pub extracted_at: DateTime<Utc>,
}

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Similarity,
    Keyword,
    Alias,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::Similarity => "similarity",
            CandidateSource::Keyword => "keyword",
            CandidateSource::Alias => "alias",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A possible canonical match for a mention.
///
/// Derived during resolution, never persisted standalone. Carries both the
/// untouched original tokens (for display) and the normalized tokens (for
/// matching and deduplication).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePath {
    pub original_tokens: Vec<String>,
    pub normalized_tokens: Vec<String>,
    /// Match confidence in [0, 1].
    pub score: f32,
    pub source: CandidateSource,
}

impl CandidatePath {
    /// Deduplication/display key: normalized tokens joined by [`PATH_DELIMITER`].
    pub fn key(&self) -> String {
        self.normalized_tokens.join(PATH_DELIMITER)
    }

    /// Context string for downstream matchers: normalized tokens joined by
    /// single spaces. Deterministic and order-preserving.
    pub fn context_string(&self) -> String {
        self.normalized_tokens.join(" ")
    }
}

/// Terminal decision of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoAccept,
    NeedsReview,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoAccept => "auto_accept",
            Decision::NeedsReview => "needs_review",
            Decision::Rejected => "rejected",
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_accept" => Ok(Decision::AutoAccept),
            "needs_review" => Ok(Decision::NeedsReview),
            "rejected" => Ok(Decision::Rejected),
            other => Err(Error::Internal(format!("unknown decision '{}'", other))),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolution attempt for a mention.
///
/// Immutable; a mention may accumulate multiple attempts if re-resolved
/// after the vocabulary changes. The decision is derivable purely from
/// `candidates`, `strict_mode`, and the configured thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub id: Uuid,
    pub mention_id: Uuid,
    /// Ranked candidates, best first.
    pub candidates: Vec<CandidatePath>,
    pub decision: Decision,
    /// Top candidate's score; 0 when there were no candidates.
    pub confidence: f32,
    /// Set only when `decision` is `AutoAccept`.
    pub resolved_key: Option<String>,
    pub strict_mode: bool,
    /// False when the ledger write failed after retry; the decision is
    /// still valid but has not been recorded yet.
    pub audited: bool,
    pub created_at: DateTime<Utc>,
}

/// Action a human reviewer took on a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Reviewer confirmed one of the offered candidates.
    Confirmed,
    /// Reviewer typed a corrected value by hand.
    ManualEntry,
    /// Reviewer rejected every candidate.
    Rejected,
    /// Reviewer deferred the mention.
    Skipped,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Confirmed => "confirmed",
            ReviewStatus::ManualEntry => "manual_entry",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Skipped => "skipped",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReviewStatus::Confirmed),
            "manual_entry" => Ok(ReviewStatus::ManualEntry),
            "rejected" => Ok(ReviewStatus::Rejected),
            "skipped" => Ok(ReviewStatus::Skipped),
            other => Err(Error::Internal(format!(
                "unknown review status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted human review action. Append-only: corrections create a new
/// record, never an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub mention_id: Uuid,
    pub chosen_candidate_key: Option<String>,
    pub manual_value: Option<String>,
    pub reviewer_id: String,
    pub review_status: ReviewStatus,
    pub decided_at: DateTime<Utc>,
}

/// Input for recording a review action.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub mention_id: Uuid,
    pub reviewer_id: String,
    pub status: ReviewStatus,
    pub chosen_candidate_key: Option<String>,
    pub manual_value: Option<String>,
    /// Entity type of the mention; required for the manual-entry
    /// contribution path.
    pub entity_type: EntityType,
}

/// A human-contributed value accumulating reuse before promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributedEntry {
    pub id: Uuid,
    pub entity_type: EntityType,
    /// Normalized lookup key; unique together with `entity_type`.
    pub normalized_value: String,
    pub display_value_primary: String,
    pub display_value_secondary: Option<String>,
    pub aliases: Vec<String>,
    pub usage_count: i64,
    pub first_seen_at: DateTime<Utc>,
    pub promoted: bool,
}

/// Input for a contribution.
#[derive(Debug, Clone)]
pub struct NewContribution {
    pub entity_type: EntityType,
    pub value_primary: String,
    pub value_secondary: Option<String>,
    pub source_mention_id: Uuid,
}

/// Result of a contribute call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionOutcome {
    pub contribution_id: Uuid,
    pub usage_count: i64,
    pub promoted: bool,
}

/// A canonical vocabulary entry, post-promotion or seeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: Uuid,
    pub entity_type: EntityType,
    /// Normalized unique identifier within the entity type.
    pub canonical_key: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for an idempotent reference insert.
#[derive(Debug, Clone)]
pub struct NewReferenceEntry {
    pub entity_type: EntityType,
    pub canonical_key: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub category: Option<String>,
}

/// Autocomplete read model: canonical entries plus still-unpromoted
/// contributions, ordered by reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestEntry {
    pub entity_type: EntityType,
    pub key: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub usage_count: i64,
    /// True when the entry comes from the canonical vocabulary.
    pub canonical: bool,
}

/// One ranked neighbor returned by the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub key: String,
    pub score: f32,
}

/// Health snapshot of the external similarity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: u64,
    pub dimension: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip() {
        for et in EntityType::ALL {
            assert_eq!(EntityType::from_str(et.as_str()).unwrap(), et);
        }
    }

    #[test]
    fn test_entity_type_unknown() {
        assert!(EntityType::from_str("hashtag").is_err());
    }

    #[test]
    fn test_entity_type_serde_snake_case() {
        let json = serde_json::to_string(&EntityType::EventType).unwrap();
        assert_eq!(json, "\"event_type\"");
    }

    #[test]
    fn test_decision_round_trip() {
        for d in [Decision::AutoAccept, Decision::NeedsReview, Decision::Rejected] {
            assert_eq!(Decision::from_str(d.as_str()).unwrap(), d);
        }
    }

    #[test]
    fn test_review_status_round_trip() {
        for s in [
            ReviewStatus::Confirmed,
            ReviewStatus::ManualEntry,
            ReviewStatus::Rejected,
            ReviewStatus::Skipped,
        ] {
            assert_eq!(ReviewStatus::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn test_candidate_path_key() {
        let path = CandidatePath {
            original_tokens: vec!["Chhattisgarh".into(), "Raigarh".into()],
            normalized_tokens: vec!["chhattisgarh".into(), "raigarh".into()],
            score: 0.9,
            source: CandidateSource::Similarity,
        };
        assert_eq!(path.key(), "chhattisgarh > raigarh");
        assert_eq!(path.context_string(), "chhattisgarh raigarh");
    }

    #[test]
    fn test_resolution_result_serde_round_trip() {
        let result = ResolutionResult {
            id: Uuid::new_v4(),
            mention_id: Uuid::new_v4(),
            candidates: vec![CandidatePath {
                original_tokens: vec!["Raigarh".into()],
                normalized_tokens: vec!["raigarh".into()],
                score: 0.91,
                source: CandidateSource::Keyword,
            }],
            decision: Decision::NeedsReview,
            confidence: 0.91,
            resolved_key: None,
            strict_mode: true,
            audited: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: ResolutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decision, Decision::NeedsReview);
        assert_eq!(back.candidates.len(), 1);
        assert_eq!(back.candidates[0].source, CandidateSource::Keyword);
    }
}
