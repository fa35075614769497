

pub mod classifier;
pub mod context;
pub mod entities;
pub mod fusion;
pub mod models;
pub mod patterns;
pub mod semantic;
pub mod structured;

pub use classifier::IntentClassifier;
pub use context::format_context;
pub use entities::{extract, BRAND_VOCABULARY};
pub use fusion::fuse;
pub use models::{
    Confidence, EntityKind, ExtractedEntities, MatchReason, Origin, QueryAnalysis, QueryType,
    RetrievalResult, RoutedResults,
};
pub use patterns::{IntentPattern, INTENT_PATTERNS};
pub use semantic::lookup_semantic;
pub use structured::lookup_structured;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::RouterConfig;
use crate::db::{CatalogError, CatalogStore};
use crate::llm::embeddings::{Embedder, EmbeddingError};
use crate::search::vector::{VectorIndex, VectorSearchError};


#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector search failed: {0}")]
    VectorSearch(#[from] VectorSearchError),

    #[error("Invalid intent pattern table: {0}")]
    PatternTable(String),
}


/// Hybrid retrieval entry point: extract, classify, run the strategies the
/// intent asks for, fuse.
pub struct QueryRouter {
    catalog: Arc<dyn CatalogStore>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    classifier: IntentClassifier,
    config: RouterConfig,
}

impl QueryRouter {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: RouterConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            index,
            classifier: IntentClassifier::default(),
            config,
        }
    }


    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }


    pub fn config(&self) -> &RouterConfig {
        &self.config
    }


    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        self.classifier.classify(query, extract(query))
    }


    pub async fn route(&self, query: &str) -> Result<RoutedResults, RouterError> {
        let analysis = self.analyze(query);
        let entities = &analysis.entities;

        debug!(
            "Routing '{}': type={}, parts={:?}, models={:?}, brands={:?}",
            crate::safe_truncate(query, 80),
            analysis.query_type,
            entities.part_numbers,
            entities.model_numbers,
            entities.brands
        );

        let run_structured = analysis.use_structured_lookup && entities.has_identifiers();
        let run_semantic = analysis.use_semantic_search;

        let structured = async {
            if !run_structured {
                return Ok(Vec::new());
            }
            lookup_structured(
                self.catalog.as_ref(),
                &entities.part_numbers,
                &entities.model_numbers,
                &entities.brands,
            )
            .await
            .map_err(RouterError::from)
        };

        let semantic = async {
            if !run_semantic {
                return Ok(Vec::new());
            }
            lookup_semantic(
                self.catalog.as_ref(),
                self.embedder.as_ref(),
                self.index.as_ref(),
                query,
                entities,
                &self.config,
            )
            .await
        };

        let (structured_matches, semantic_matches) = tokio::try_join!(structured, semantic)?;
        let combined = fuse(&structured_matches, &semantic_matches, &entities.model_numbers);

        info!(
            "Routed {} query: {} structured + {} semantic -> {} combined",
            analysis.query_type,
            structured_matches.len(),
            semantic_matches.len(),
            combined.len()
        );

        Ok(RoutedResults {
            structured_matches,
            semantic_matches,
            combined,
            analysis,
        })
    }


    pub async fn route_with_context(&self, query: &str) -> Result<(RoutedResults, Option<String>), RouterError> {
        let routed = self.route(query).await?;
        let context = format_context(&routed, query, &self.config);
        Ok((routed, context))
    }
}
