//! Candidate collection and deduplication.
//!
//! Accepts heterogeneous mention representations — a hierarchical string
//! like `"Chhattisgarh > Raigarh > Ward-1"` or a pre-tokenized sequence —
//! and produces an ordered, deduplicated set of [`CandidatePath`]s. Each
//! path keeps the untouched original tokens for display alongside the
//! normalized tokens used for matching.

use std::collections::HashMap;

use crate::models::{CandidatePath, CandidateSource};
use crate::normalize::normalize_token;

/// Hierarchy separators recognized in single-string representations.
const HIERARCHY_SEPARATORS: [char; 2] = ['>', ','];

/// One incoming representation of a candidate.
#[derive(Debug, Clone)]
pub enum CandidateInput {
    /// Single string using `>` or `,` as level separator.
    Hierarchy {
        text: String,
        score: f32,
        source: CandidateSource,
    },
    /// Pre-tokenized ordered sequence.
    Tokens {
        tokens: Vec<String>,
        score: f32,
        source: CandidateSource,
    },
}

impl CandidateInput {
    /// Hierarchical string representation.
    pub fn hierarchy(text: impl Into<String>, score: f32, source: CandidateSource) -> Self {
        CandidateInput::Hierarchy {
            text: text.into(),
            score,
            source,
        }
    }

    /// Pre-tokenized representation.
    pub fn tokens(tokens: Vec<String>, score: f32, source: CandidateSource) -> Self {
        CandidateInput::Tokens {
            tokens,
            score,
            source,
        }
    }

    fn into_parts(self) -> (Vec<String>, f32, CandidateSource) {
        match self {
            CandidateInput::Hierarchy {
                text,
                score,
                source,
            } => (split_hierarchy(&text), score, source),
            CandidateInput::Tokens {
                tokens,
                score,
                source,
            } => (
                tokens
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
                score,
                source,
            ),
        }
    }
}

/// Split a hierarchical string on the first separator that occurs in it.
fn split_hierarchy(text: &str) -> Vec<String> {
    let separator = HIERARCHY_SEPARATORS
        .iter()
        .copied()
        .find(|sep| text.contains(*sep));

    match separator {
        Some(sep) => text
            .split(sep)
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        None => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}

/// Collect heterogeneous inputs into an ordered, deduplicated candidate set.
///
/// Deduplication key = normalized-token sequence joined with the path
/// delimiter. On a duplicate, the first-seen original tokens are retained
/// and the better score wins. Blank or whitespace-only inputs are dropped
/// silently, never surfaced as candidates.
pub fn collect_candidates(inputs: Vec<CandidateInput>) -> Vec<CandidatePath> {
    let mut paths: Vec<CandidatePath> = Vec::with_capacity(inputs.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for input in inputs {
        let (original_tokens, score, source) = input.into_parts();

        let normalized_tokens: Vec<String> = original_tokens
            .iter()
            .map(|t| normalize_token(t))
            .filter(|t| !t.is_empty())
            .collect();

        if normalized_tokens.is_empty() {
            continue;
        }

        let path = CandidatePath {
            original_tokens,
            normalized_tokens,
            score,
            source,
        };

        match index_by_key.get(&path.key()) {
            Some(&i) => {
                // First-seen original tokens win; best score wins.
                if path.score > paths[i].score {
                    paths[i].score = path.score;
                    paths[i].source = path.source;
                }
            }
            None => {
                index_by_key.insert(path.key(), paths.len());
                paths.push(path);
            }
        }
    }

    paths
}

/// Render a normalized hierarchy as the context string handed to matchers:
/// lowercase, space-joined, order-preserving.
pub fn context_string(path: &CandidatePath) -> String {
    path.context_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(paths: &[CandidatePath]) -> Vec<String> {
        paths.iter().map(|p| p.key()).collect()
    }

    #[test]
    fn test_collapse_heterogeneous_representations() {
        // Hierarchy string, token array, and a blank input collapse to one
        // path; the first-seen original tokens survive.
        let inputs = vec![
            CandidateInput::hierarchy(
                "Chhattisgarh > Raigarh > Ward-1",
                0.8,
                CandidateSource::Similarity,
            ),
            CandidateInput::tokens(
                vec!["chhattisgarh".into(), "raigarh".into(), "ward 1".into()],
                0.6,
                CandidateSource::Keyword,
            ),
            CandidateInput::hierarchy("   ", 0.9, CandidateSource::Alias),
        ];

        let paths = collect_candidates(inputs);
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0].original_tokens,
            vec!["Chhattisgarh", "Raigarh", "Ward-1"]
        );
        assert_eq!(
            paths[0].normalized_tokens,
            vec!["chhattisgarh", "raigarh", "ward 1"]
        );
        // Best score across duplicates wins.
        assert_eq!(paths[0].score, 0.8);
    }

    #[test]
    fn test_comma_separator() {
        let paths = collect_candidates(vec![CandidateInput::hierarchy(
            "Chhattisgarh, Raigarh",
            0.5,
            CandidateSource::Similarity,
        )]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].original_tokens, vec!["Chhattisgarh", "Raigarh"]);
    }

    #[test]
    fn test_single_level_hierarchy() {
        let paths = collect_candidates(vec![CandidateInput::hierarchy(
            "Raigarh",
            0.5,
            CandidateSource::Similarity,
        )]);
        assert_eq!(keys(&paths), vec!["raigarh"]);
    }

    #[test]
    fn test_order_preserved_first_seen() {
        let paths = collect_candidates(vec![
            CandidateInput::hierarchy("B > C", 0.2, CandidateSource::Similarity),
            CandidateInput::hierarchy("A", 0.9, CandidateSource::Similarity),
            CandidateInput::hierarchy("b > c", 0.1, CandidateSource::Keyword),
        ]);
        assert_eq!(keys(&paths), vec!["b > c", "a"]);
    }

    #[test]
    fn test_blank_inputs_dropped_silently() {
        let paths = collect_candidates(vec![
            CandidateInput::hierarchy("", 0.9, CandidateSource::Similarity),
            CandidateInput::tokens(vec!["  ".into(), "".into()], 0.9, CandidateSource::Keyword),
            CandidateInput::hierarchy(" > > ", 0.9, CandidateSource::Similarity),
        ]);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_empty_token_levels_skipped() {
        let paths = collect_candidates(vec![CandidateInput::tokens(
            vec!["Raigarh".into(), "   ".into(), "Ward-1".into()],
            0.5,
            CandidateSource::Similarity,
        )]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].original_tokens, vec!["Raigarh", "Ward-1"]);
        assert_eq!(paths[0].normalized_tokens, vec!["raigarh", "ward 1"]);
    }

    #[test]
    fn test_context_string_is_lowercase_space_joined() {
        let paths = collect_candidates(vec![CandidateInput::hierarchy(
            "Chhattisgarh > Raigarh > Ward-1",
            0.5,
            CandidateSource::Similarity,
        )]);
        assert_eq!(context_string(&paths[0]), "chhattisgarh raigarh ward 1");
    }

    #[test]
    fn test_collection_is_deterministic() {
        let build = || {
            collect_candidates(vec![
                CandidateInput::hierarchy("A > B", 0.4, CandidateSource::Similarity),
                CandidateInput::hierarchy("C", 0.9, CandidateSource::Keyword),
                CandidateInput::tokens(vec!["a".into(), "b".into()], 0.7, CandidateSource::Alias),
            ])
        };
        assert_eq!(build(), build());
    }
}
