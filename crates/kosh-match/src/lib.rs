//! # kosh-match
//!
//! Candidate match providers for the kosh resolution engine.
//!
//! This crate provides:
//! - An HTTP client for the external similarity index, with bounded
//!   timeouts and graceful degradation
//! - The keyword rule matcher with its immutable per-entity-type registry
//! - The explicit, ordered provider chain that makes fallback a testable
//!   contract
//! - A deterministic mock client for tests

pub mod chain;
pub mod keyword;
pub mod mock;
pub mod similarity;

pub use chain::{CandidateProvider, KeywordProvider, ProviderChain, SimilarityProvider};
pub use keyword::{keyword_score, KeywordMatch, KeywordRule, KeywordRuleSet, BUILTIN_RULES};
pub use mock::MockSimilarityClient;
pub use similarity::{HttpSimilarityClient, SimilaritySearch, DEFAULT_SEARCH_URL};
