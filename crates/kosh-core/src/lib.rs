//! # kosh-core
//!
//! Core types, traits, and pure logic for the kosh entity-resolution
//! engine.
//!
//! This crate provides the foundational data structures and deterministic
//! building blocks the other kosh crates depend on: the error taxonomy,
//! the domain model, mention normalization, candidate collection, and the
//! resolver configuration surface.

pub mod candidates;
pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use candidates::{collect_candidates, context_string, CandidateInput};
pub use config::{ResolverConfig, StrictMode};
pub use error::{Error, Result};
pub use models::*;
pub use normalize::{is_blank, normalize, normalize_token};
pub use uuid_utils::{extract_timestamp, is_v7, new_v7, v7_from_timestamp};
