//! Data model shared by the router stages.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::db::ProductRecord;
use crate::utils::push_unique;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryType {
    Compatibility,
    Installation,
    PartLookup,
    ModelParts,
    Troubleshooting,
    ProductSearch,
    General,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    PartNumber,
    ModelNumber,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}


/// Identifiers pulled out of a query. Each list is ordered by first
/// appearance and duplicate-free; a value never appears in both
/// `part_numbers` and `model_numbers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub part_numbers: Vec<String>,
    pub model_numbers: Vec<String>,
    pub brands: Vec<String>,
}

impl ExtractedEntities {

    pub fn has(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::PartNumber => !self.part_numbers.is_empty(),
            EntityKind::ModelNumber => !self.model_numbers.is_empty(),
        }
    }


    pub fn has_identifiers(&self) -> bool {
        self.has(EntityKind::PartNumber) || self.has(EntityKind::ModelNumber)
    }


    pub fn is_empty(&self) -> bool {
        !self.has_identifiers() && self.brands.is_empty()
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    #[serde(flatten)]
    pub entities: ExtractedEntities,
    pub query_type: QueryType,
    pub use_structured_lookup: bool,
    pub use_semantic_search: bool,
    pub confidence: Confidence,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Structured,
    Semantic,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatchReason {
    /// Direct hit on the record's own part number.
    PartNumber(String),
    /// The record lists this part number in its replacement list.
    ReplacesPart(String),
    /// The record lists this model in its compatible-model list.
    CompatibleModel(String),
    Similarity,
}

impl MatchReason {

    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::ReplacesPart(_) | Self::CompatibleModel(_))
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartNumber(part) => write!(f, "part number {}", part),
            Self::ReplacesPart(part) => write!(f, "replaces part {}", part),
            Self::CompatibleModel(model) => write!(f, "compatible with model {}", model),
            Self::Similarity => write!(f, "similar to the question"),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub record: ProductRecord,
    pub origin: Origin,
    pub relevance_score: Option<f32>,
    pub match_reasons: Vec<MatchReason>,
}

impl RetrievalResult {

    pub fn structured(record: ProductRecord, reason: MatchReason) -> Self {
        Self {
            record,
            origin: Origin::Structured,
            relevance_score: None,
            match_reasons: vec![reason],
        }
    }


    pub fn semantic(record: ProductRecord, score: Option<f32>, reason: MatchReason) -> Self {
        Self {
            record,
            origin: Origin::Semantic,
            relevance_score: score,
            match_reasons: vec![reason],
        }
    }


    pub fn id(&self) -> &str {
        &self.record.part_number
    }

    /// Merge another hit for the same record into this one. Origin is kept;
    /// the match reasons are unioned and a missing score is filled when
    /// `take_score` is set.
    pub fn absorb(&mut self, other: RetrievalResult, take_score: bool) {
        for reason in other.match_reasons {
            if !self.match_reasons.contains(&reason) {
                self.match_reasons.push(reason);
            }
        }
        if take_score && self.relevance_score.is_none() {
            self.relevance_score = other.relevance_score;
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedResults {
    pub structured_matches: Vec<RetrievalResult>,
    pub semantic_matches: Vec<RetrievalResult>,
    pub combined: Vec<RetrievalResult>,
    pub analysis: QueryAnalysis,
}

impl RoutedResults {

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }


    pub fn product_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.combined.len());
        for result in &self.combined {
            push_unique(&mut ids, result.id().to_string());
        }
        ids
    }
}


/// Keep the first result per record id, folding later duplicates into it.
pub(crate) fn dedupe_by_id(results: Vec<RetrievalResult>, take_score: bool) -> Vec<RetrievalResult> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<RetrievalResult> = Vec::with_capacity(results.len());

    for result in results {
        let key = result.id().trim().to_uppercase();
        match positions.get(&key) {
            Some(&idx) => unique[idx].absorb(result, take_score),
            None => {
                positions.insert(key, unique.len());
                unique.push(result);
            }
        }
    }

    unique
}


pub(crate) fn filter_by_brand(results: Vec<RetrievalResult>, brands: &[String]) -> Vec<RetrievalResult> {
    if brands.is_empty() {
        return results;
    }
    results
        .into_iter()
        .filter(|r| r.record.matches_any_brand(brands))
        .collect()
}
