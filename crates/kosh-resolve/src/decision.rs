//! The resolution decision policy.
//!
//! This is the one place where product behavior is codified as policy
//! rather than heuristics. The decision is derived purely from the ranked
//! candidate list, the strict-mode flag, and the configured thresholds.
//! There is no hidden state, so identical inputs always produce identical
//! decisions.
//!
//! | Candidates | strict              | lenient              |
//! |------------|---------------------|----------------------|
//! | 0          | `NoCandidatesFound` | needs_review, conf 0 |
//! | 1          | accept iff ≥ 0.98   | accept iff ≥ 0.88    |
//! | ≥2         | needs_review        | needs_review         |
//!
//! Ambiguity is never auto-resolved: two or more candidates always route
//! to a human, in either mode.

use uuid::Uuid;

use kosh_core::{defaults, CandidatePath, Decision, Error, Result, ResolverConfig};

/// Acceptance thresholds for single-candidate decisions.
///
/// The strict and lenient floors are configured independently; the
/// lenient default happening to equal the keyword matcher's high band is
/// coincidence, not contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// Single-candidate auto-accept floor in strict mode.
    pub strict_accept_threshold: f32,
    /// Single-candidate auto-accept floor in lenient mode.
    pub lenient_accept_threshold: f32,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            strict_accept_threshold: defaults::ACCEPT_THRESHOLD_STRICT,
            lenient_accept_threshold: defaults::ACCEPT_THRESHOLD_LENIENT,
        }
    }
}

impl DecisionPolicy {
    /// Pull the thresholds out of a resolver configuration.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            strict_accept_threshold: config.strict_accept_threshold,
            lenient_accept_threshold: config.lenient_accept_threshold,
        }
    }

    /// Auto-accept floor for the given strictness.
    pub fn accept_threshold(&self, strict: bool) -> f32 {
        if strict {
            self.strict_accept_threshold
        } else {
            self.lenient_accept_threshold
        }
    }
}

/// Outcome of applying the decision table.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    /// Top candidate's score; 0 when there were no candidates.
    pub confidence: f32,
    /// Set only on auto-accept.
    pub resolved_key: Option<String>,
}

/// Apply the decision table to a ranked candidate list (best first).
///
/// Pure and deterministic. The only error path is strict mode with zero
/// candidates, which fails with [`Error::NoCandidatesFound`].
pub fn decide(
    mention_id: Uuid,
    candidates: &[CandidatePath],
    strict_mode: bool,
    policy: &DecisionPolicy,
) -> Result<Verdict> {
    match candidates {
        [] => {
            if strict_mode {
                Err(Error::NoCandidatesFound { mention_id })
            } else {
                Ok(Verdict {
                    decision: Decision::NeedsReview,
                    confidence: 0.0,
                    resolved_key: None,
                })
            }
        }
        [only] => {
            let threshold = policy.accept_threshold(strict_mode);
            if only.score >= threshold {
                Ok(Verdict {
                    decision: Decision::AutoAccept,
                    confidence: only.score,
                    resolved_key: Some(only.key()),
                })
            } else {
                Ok(Verdict {
                    decision: Decision::NeedsReview,
                    confidence: only.score,
                    resolved_key: None,
                })
            }
        }
        [top, ..] => Ok(Verdict {
            decision: Decision::NeedsReview,
            confidence: top.score,
            resolved_key: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosh_core::CandidateSource;

    fn candidate(key: &str, score: f32) -> CandidatePath {
        CandidatePath {
            original_tokens: vec![key.to_string()],
            normalized_tokens: vec![key.to_string()],
            score,
            source: CandidateSource::Similarity,
        }
    }

    fn candidates(count: usize, top_score: f32) -> Vec<CandidatePath> {
        (0..count)
            .map(|i| candidate(&format!("key-{}", i), top_score - 0.01 * i as f32))
            .collect()
    }

    #[test]
    fn test_zero_candidates_strict_fails() {
        let mention_id = Uuid::new_v4();
        let err = decide(mention_id, &[], true, &DecisionPolicy::default()).unwrap_err();
        match err {
            Error::NoCandidatesFound { mention_id: id } => assert_eq!(id, mention_id),
            other => panic!("expected NoCandidatesFound, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_candidates_lenient_needs_review() {
        let verdict = decide(Uuid::new_v4(), &[], false, &DecisionPolicy::default()).unwrap();
        assert_eq!(verdict.decision, Decision::NeedsReview);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.resolved_key, None);
    }

    #[test]
    fn test_single_candidate_strict_vs_lenient_at_095() {
        // 0.95 is below the strict floor but above the lenient one.
        let list = candidates(1, 0.95);
        let policy = DecisionPolicy::default();

        let strict = decide(Uuid::new_v4(), &list, true, &policy).unwrap();
        assert_eq!(strict.decision, Decision::NeedsReview);
        assert_eq!(strict.resolved_key, None);

        let lenient = decide(Uuid::new_v4(), &list, false, &policy).unwrap();
        assert_eq!(lenient.decision, Decision::AutoAccept);
        assert_eq!(lenient.resolved_key.as_deref(), Some("key-0"));
    }

    #[test]
    fn test_decision_table_exhaustive_grid() {
        let policy = DecisionPolicy::default();

        for count in [0usize, 1, 2, 5] {
            for strict in [true, false] {
                for top_score in [0.5f32, 0.9, 0.98, 0.99] {
                    let list = candidates(count, top_score);
                    let outcome = decide(Uuid::new_v4(), &list, strict, &policy);

                    match (count, strict) {
                        (0, true) => {
                            assert!(matches!(
                                outcome,
                                Err(Error::NoCandidatesFound { .. })
                            ));
                        }
                        (0, false) => {
                            let v = outcome.unwrap();
                            assert_eq!(v.decision, Decision::NeedsReview);
                            assert_eq!(v.confidence, 0.0);
                        }
                        (1, _) => {
                            let threshold = if strict { 0.98 } else { 0.88 };
                            let v = outcome.unwrap();
                            if top_score >= threshold {
                                assert_eq!(
                                    v.decision,
                                    Decision::AutoAccept,
                                    "count=1 strict={} score={}",
                                    strict,
                                    top_score
                                );
                                assert!(v.resolved_key.is_some());
                            } else {
                                assert_eq!(
                                    v.decision,
                                    Decision::NeedsReview,
                                    "count=1 strict={} score={}",
                                    strict,
                                    top_score
                                );
                                assert!(v.resolved_key.is_none());
                            }
                            assert_eq!(v.confidence, top_score);
                        }
                        (_, _) => {
                            // Ambiguity is never auto-resolved.
                            let v = outcome.unwrap();
                            assert_eq!(v.decision, Decision::NeedsReview);
                            assert_eq!(v.confidence, top_score);
                            assert!(v.resolved_key.is_none());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_boundary_exact_threshold_accepts() {
        let policy = DecisionPolicy::default();

        let strict = decide(Uuid::new_v4(), &candidates(1, 0.98), true, &policy).unwrap();
        assert_eq!(strict.decision, Decision::AutoAccept);

        let lenient = decide(Uuid::new_v4(), &candidates(1, 0.88), false, &policy).unwrap();
        assert_eq!(lenient.decision, Decision::AutoAccept);
    }

    #[test]
    fn test_custom_policy_thresholds_are_independent() {
        let policy = DecisionPolicy {
            strict_accept_threshold: 0.99,
            lenient_accept_threshold: 0.75,
        };

        let v = decide(Uuid::new_v4(), &candidates(1, 0.8), false, &policy).unwrap();
        assert_eq!(v.decision, Decision::AutoAccept);

        let v = decide(Uuid::new_v4(), &candidates(1, 0.985), true, &policy).unwrap();
        assert_eq!(v.decision, Decision::NeedsReview);
    }

    #[test]
    fn test_decide_is_deterministic() {
        let list = candidates(2, 0.9);
        let policy = DecisionPolicy::default();
        let id = Uuid::new_v4();

        let a = decide(id, &list, false, &policy).unwrap();
        let b = decide(id, &list, false, &policy).unwrap();
        assert_eq!(a, b);
    }
}
