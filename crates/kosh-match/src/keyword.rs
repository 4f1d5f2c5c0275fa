//! Keyword rule matching.
//!
//! Entity-type-specific rule tables map a canonical key to the surface
//! keywords that evidence it. The registry is built once at startup and
//! immutable afterwards; adding an entity type means adding rules to the
//! builder, not mutating a shared map at runtime.
//!
//! Scoring: each keyword found as a substring of the normalized mention
//! text counts as one piece of evidence;
//! `score = min(0.45 + 0.25 × evidence_count, 0.99)`. Keys with zero
//! evidence are excluded, scores below the noise floor are discarded, and
//! the ranking is deterministic: descending score, ties broken by
//! lexicographic key.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use kosh_core::{defaults, normalize, EntityType};

/// One canonical key and the surface keywords that evidence it.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// Canonical key within the entity type's vocabulary.
    pub key: String,
    /// Surface keywords, stored normalized.
    pub keywords: Vec<String>,
}

impl KeywordRule {
    /// Build a rule, normalizing every keyword.
    pub fn new(key: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            key: key.into(),
            keywords: keywords.iter().map(|k| normalize(k)).collect(),
        }
    }
}

/// A ranked keyword match with its supporting evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub key: String,
    pub score: f32,
    /// The keywords found in the mention text.
    pub evidence: Vec<String>,
}

/// Immutable registry of keyword rules per entity type.
#[derive(Debug, Clone, Default)]
pub struct KeywordRuleSet {
    rules: HashMap<EntityType, Vec<KeywordRule>>,
}

impl KeywordRuleSet {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule table: bilingual (Hindi/English) surface forms
    /// for the event categories and welfare schemes that dominate the
    /// source posts.
    pub fn builtin() -> Self {
        let mut set = Self::new();

        set = set.with_rules(
            EntityType::EventType,
            vec![
                KeywordRule::new("flood", &["flood", "बाढ़", "जलभराव", "waterlogging"]),
                KeywordRule::new("drought", &["drought", "सूखा", "akal", "अकाल"]),
                KeywordRule::new(
                    "road_accident",
                    &["accident", "दुर्घटना", "सड़क हादसा", "collision"],
                ),
                KeywordRule::new("protest", &["protest", "धरना", "प्रदर्शन", "rally", "आंदोलन"]),
                KeywordRule::new(
                    "health_camp",
                    &["health camp", "स्वास्थ्य शिविर", "medical camp", "टीकाकरण"],
                ),
                KeywordRule::new("fire", &["fire", "आग", "अग्निकांड", "blaze"]),
                KeywordRule::new(
                    "power_outage",
                    &["power cut", "बिजली कटौती", "outage", "बिजली गुल"],
                ),
            ],
        );

        set = set.with_rules(
            EntityType::Scheme,
            vec![
                KeywordRule::new("mgnrega", &["mgnrega", "nrega", "मनरेगा", "रोज़गार गारंटी"]),
                KeywordRule::new(
                    "pm_awas_yojana",
                    &["awas yojana", "आवास योजना", "pmay", "housing scheme"],
                ),
                KeywordRule::new(
                    "jal_jeevan_mission",
                    &["jal jeevan", "जल जीवन", "har ghar jal", "हर घर जल"],
                ),
                KeywordRule::new(
                    "pds",
                    &["ration", "राशन", "pds", "उचित मूल्य दुकान", "fair price shop"],
                ),
                KeywordRule::new(
                    "ayushman_bharat",
                    &["ayushman", "आयुष्मान", "health card", "गोल्डन कार्ड"],
                ),
            ],
        );

        set
    }

    /// Add rules for an entity type, replacing any existing list.
    pub fn with_rules(mut self, entity_type: EntityType, rules: Vec<KeywordRule>) -> Self {
        self.rules.insert(entity_type, rules);
        self
    }

    /// Rules registered for an entity type.
    pub fn rules_for(&self, entity_type: EntityType) -> &[KeywordRule] {
        self.rules.get(&entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rank canonical keys by keyword evidence found in the normalized
    /// mention text.
    pub fn match_mention(&self, entity_type: EntityType, normalized_text: &str) -> Vec<KeywordMatch> {
        let mut matches: Vec<KeywordMatch> = self
            .rules_for(entity_type)
            .iter()
            .filter_map(|rule| {
                let evidence: Vec<String> = rule
                    .keywords
                    .iter()
                    .filter(|kw| !kw.is_empty() && normalized_text.contains(kw.as_str()))
                    .cloned()
                    .collect();

                if evidence.is_empty() {
                    return None;
                }

                let score = keyword_score(evidence.len());
                if score < defaults::KEYWORD_SCORE_FLOOR {
                    return None;
                }

                Some(KeywordMatch {
                    key: rule.key.clone(),
                    score,
                    evidence,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });

        matches
    }
}

/// Evidence-weighted score: `min(0.45 + 0.25 × evidence_count, 0.99)`.
pub fn keyword_score(evidence_count: usize) -> f32 {
    (defaults::KEYWORD_SCORE_BASE + defaults::KEYWORD_SCORE_STEP * evidence_count as f32)
        .min(defaults::KEYWORD_SCORE_CAP)
}

/// Shared built-in registry, constructed on first use and immutable
/// thereafter.
pub static BUILTIN_RULES: Lazy<KeywordRuleSet> = Lazy::new(KeywordRuleSet::builtin);

#[cfg(test)]
mod tests {
    use super::*;
    use kosh_core::normalize;

    #[test]
    fn test_score_formula() {
        assert!((keyword_score(1) - 0.70).abs() < 1e-6);
        assert!((keyword_score(2) - 0.95).abs() < 1e-6);
        // Capped: 0.45 + 0.25 * 3 = 1.20 -> 0.99
        assert!((keyword_score(3) - 0.99).abs() < 1e-6);
        assert!((keyword_score(10) - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_zero_evidence_excluded() {
        let matches = BUILTIN_RULES.match_mention(
            EntityType::EventType,
            &normalize("village road inauguration ceremony"),
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_single_keyword_evidence() {
        let matches =
            BUILTIN_RULES.match_mention(EntityType::EventType, &normalize("Flood in Raigarh"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "flood");
        assert_eq!(matches[0].evidence, vec!["flood"]);
        assert!((matches[0].score - 0.70).abs() < 1e-6);
    }

    #[test]
    fn test_hindi_keyword_evidence() {
        let matches =
            BUILTIN_RULES.match_mention(EntityType::EventType, &normalize("रायगढ़ में बाढ़"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "flood");
    }

    #[test]
    fn test_multiple_evidence_raises_score() {
        let matches = BUILTIN_RULES.match_mention(
            EntityType::EventType,
            &normalize("flood and waterlogging in ward 3"),
        );
        assert_eq!(matches[0].key, "flood");
        assert_eq!(matches[0].evidence.len(), 2);
        assert!((matches[0].score - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_tie_broken_by_key() {
        let set = KeywordRuleSet::new().with_rules(
            EntityType::EventType,
            vec![
                KeywordRule::new("zeta", &["storm"]),
                KeywordRule::new("alpha", &["storm"]),
            ],
        );
        let matches = set.match_mention(EntityType::EventType, "storm warning");
        assert_eq!(matches.len(), 2);
        // Equal scores: lexicographic key order keeps results deterministic.
        assert_eq!(matches[0].key, "alpha");
        assert_eq!(matches[1].key, "zeta");
    }

    #[test]
    fn test_scheme_rules() {
        let matches =
            BUILTIN_RULES.match_mention(EntityType::Scheme, &normalize("मनरेगा मजदूरी बकाया"));
        assert_eq!(matches[0].key, "mgnrega");
    }

    #[test]
    fn test_unconfigured_entity_type_yields_nothing() {
        let matches = BUILTIN_RULES.match_mention(EntityType::Person, "flood");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_match_is_deterministic() {
        let text = normalize("flood waterlogging ration");
        let a = BUILTIN_RULES.match_mention(EntityType::EventType, &text);
        let b = BUILTIN_RULES.match_mention(EntityType::EventType, &text);
        assert_eq!(a, b);
    }
}
