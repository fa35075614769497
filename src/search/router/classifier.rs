

use std::sync::Arc;
use tracing::debug;

use super::models::{ExtractedEntities, QueryAnalysis};
use super::patterns::{IntentPattern, INTENT_PATTERNS};
use super::RouterError;


#[derive(Debug, Clone)]
pub struct IntentClassifier {
    patterns: Arc<[IntentPattern]>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self {
            patterns: Arc::from(INTENT_PATTERNS),
        }
    }
}

impl IntentClassifier {
    /// Use a custom table. It must be non-empty and end with a row that
    /// requires nothing and has no keywords.
    pub fn with_patterns(patterns: Vec<IntentPattern>) -> Result<Self, RouterError> {
        let Some(last) = patterns.last() else {
            return Err(RouterError::PatternTable("pattern table is empty".to_string()));
        };
        if !last.is_catch_all() {
            return Err(RouterError::PatternTable(format!(
                "last pattern ({}) must require nothing and have no keywords",
                last.query_type
            )));
        }
        Ok(Self {
            patterns: patterns.into(),
        })
    }


    pub fn patterns(&self) -> &[IntentPattern] {
        &self.patterns
    }


    pub fn classify(&self, query: &str, entities: ExtractedEntities) -> QueryAnalysis {
        let query_lower = query.to_lowercase();

        let pattern = self
            .patterns
            .iter()
            .find(|p| p.matches(&query_lower, &entities))
            .unwrap_or(&self.patterns[self.patterns.len() - 1]);

        debug!(
            "Classified query as {} (structured={}, semantic={}, confidence={})",
            pattern.query_type, pattern.use_structured_lookup, pattern.use_semantic_search, pattern.confidence
        );

        QueryAnalysis {
            entities,
            query_type: pattern.query_type,
            use_structured_lookup: pattern.use_structured_lookup,
            use_semantic_search: pattern.use_semantic_search,
            confidence: pattern.confidence,
        }
    }
}
