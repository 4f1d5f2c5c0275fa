//! # kosh-resolve
//!
//! Resolution decision engine and service for kosh.
//!
//! This crate provides:
//! - The decision policy: the one deterministic table deciding whether a
//!   match is accepted automatically or routed to human review
//! - The [`Resolver`] service wiring normalization, the provider chain,
//!   the decision policy, the audit ledger, and the contribution store
//!   into the programmatic operations kosh exposes:
//!   `resolve`, `review`, `contribute`, `suggest`

pub mod decision;
pub mod engine;

pub use decision::{decide, DecisionPolicy, Verdict};
pub use engine::{resolver_from_env, Resolver};
