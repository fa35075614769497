

use super::models::{Confidence, EntityKind, ExtractedEntities, QueryType};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentPattern {
    pub query_type: QueryType,
    pub requires: &'static [EntityKind],
    pub keywords: &'static [&'static str],
    pub use_structured_lookup: bool,
    pub use_semantic_search: bool,
    pub confidence: Confidence,
}

impl IntentPattern {
    /// Entity requirement first, then keyword containment. An empty keyword
    /// list accepts anything that passed the entity check.
    pub fn matches(&self, query_lower: &str, entities: &ExtractedEntities) -> bool {
        if !self.requires.iter().all(|kind| entities.has(*kind)) {
            return false;
        }
        self.keywords.is_empty() || self.keywords.iter().any(|kw| query_lower.contains(kw))
    }


    pub fn is_catch_all(&self) -> bool {
        self.requires.is_empty() && self.keywords.is_empty()
    }
}


/// Ordered intent table. Earlier rows win; rows that need an identifier come
/// before keyword-only rows, and `general` must stay last.
pub static INTENT_PATTERNS: &[IntentPattern] = &[
    IntentPattern {
        query_type: QueryType::Compatibility,
        requires: &[EntityKind::PartNumber, EntityKind::ModelNumber],
        keywords: &[
            "compatible", "compatibility", "fit", "fits", "work with", "works with", "match",
        ],
        use_structured_lookup: true,
        use_semantic_search: true,
        confidence: Confidence::High,
    },
    IntentPattern {
        query_type: QueryType::Installation,
        requires: &[EntityKind::PartNumber],
        keywords: &[
            "install", "installation", "replace", "replacing", "remove", "how do i", "how to", "put in",
        ],
        use_structured_lookup: true,
        use_semantic_search: true,
        confidence: Confidence::High,
    },
    IntentPattern {
        query_type: QueryType::PartLookup,
        requires: &[EntityKind::PartNumber],
        keywords: &[],
        use_structured_lookup: true,
        use_semantic_search: false,
        confidence: Confidence::High,
    },
    IntentPattern {
        query_type: QueryType::ModelParts,
        requires: &[EntityKind::ModelNumber],
        keywords: &[],
        use_structured_lookup: true,
        use_semantic_search: true,
        confidence: Confidence::Medium,
    },
    IntentPattern {
        query_type: QueryType::Troubleshooting,
        requires: &[],
        keywords: &[
            "not working", "broken", "leak", "leaking", "noise", "noisy", "won't", "doesn't",
            "stopped", "problem", "issue", "fix", "troubleshoot", "repair", "error",
        ],
        use_structured_lookup: false,
        use_semantic_search: true,
        confidence: Confidence::Medium,
    },
    IntentPattern {
        query_type: QueryType::ProductSearch,
        requires: &[],
        keywords: &[
            "part", "parts", "filter", "shelf", "bin", "door", "ice maker", "dishwasher",
            "refrigerator", "fridge", "rack", "seal", "gasket", "pump", "motor", "valve",
            "replacement", "buy", "price", "find",
        ],
        use_structured_lookup: false,
        use_semantic_search: true,
        confidence: Confidence::Low,
    },
    IntentPattern {
        query_type: QueryType::General,
        requires: &[],
        keywords: &[],
        use_structured_lookup: false,
        use_semantic_search: false,
        confidence: Confidence::Low,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(parts: &[&str], models: &[&str]) -> ExtractedEntities {
        ExtractedEntities {
            part_numbers: parts.iter().map(|s| s.to_string()).collect(),
            model_numbers: models.iter().map(|s| s.to_string()).collect(),
            brands: Vec::new(),
        }
    }

    #[test]
    fn test_table_ends_with_catch_all() {
        let last = INTENT_PATTERNS.last().unwrap();
        assert_eq!(last.query_type, QueryType::General);
        assert!(last.is_catch_all());
        assert_eq!(INTENT_PATTERNS.iter().filter(|p| p.is_catch_all()).count(), 1);
    }

    #[test]
    fn test_identifier_rows_precede_keyword_rows() {
        let first_keyword_only = INTENT_PATTERNS
            .iter()
            .position(|p| p.requires.is_empty())
            .unwrap();
        assert!(INTENT_PATTERNS[first_keyword_only..].iter().all(|p| p.requires.is_empty()));
    }

    #[test]
    fn test_requirement_checked_before_keywords() {
        let compat = &INTENT_PATTERNS[0];
        assert!(!compat.matches("is this compatible", &entities(&["PS1234567"], &[])));
        assert!(compat.matches("is this compatible", &entities(&["PS1234567"], &["WDT780SAEM1"])));
    }

    #[test]
    fn test_empty_keywords_accept_anything_meeting_requirements() {
        let lookup = &INTENT_PATTERNS[2];
        assert!(lookup.matches("ps1234567", &entities(&["PS1234567"], &[])));
        assert!(!lookup.matches("ps1234567", &entities(&[], &[])));
    }

    #[test]
    fn test_greeting_hits_no_keywords() {
        let e = ExtractedEntities::default();
        let hits: Vec<QueryType> = INTENT_PATTERNS
            .iter()
            .filter(|p| p.matches("hello", &e))
            .map(|p| p.query_type)
            .collect();
        assert_eq!(hits, vec![QueryType::General]);
    }
}
