

use futures::future::try_join_all;
use tracing::debug;

use super::models::{dedupe_by_id, filter_by_brand, ExtractedEntities, MatchReason, RetrievalResult};
use super::RouterError;
use crate::core::RouterConfig;
use crate::db::CatalogStore;
use crate::llm::embeddings::Embedder;
use crate::search::vector::VectorIndex;


pub(crate) fn search_text(query: &str, brands: &[String]) -> String {
    if brands.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", query, brands.join(" "))
    }
}


/// Similarity retrieval. Parts compatible with an extracted model are merged
/// in ahead of the vector hits and are all kept; only the remaining vector
/// hits are cut to `semantic_top_k`. A blank search text skips the vector
/// index.
pub async fn lookup_semantic(
    catalog: &dyn CatalogStore,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    query: &str,
    entities: &ExtractedEntities,
    config: &RouterConfig,
) -> Result<Vec<RetrievalResult>, RouterError> {
    let text = search_text(query, &entities.brands);

    let model_hits = try_join_all(entities.model_numbers.iter().map(|model| async move {
        let records = catalog.find_by_compatible_model(model).await?;
        Ok::<_, RouterError>(
            records
                .into_iter()
                .map(|record| RetrievalResult::semantic(record, None, MatchReason::CompatibleModel(model.clone())))
                .collect::<Vec<_>>(),
        )
    }));

    let vector_hits = async {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let vector = embedder.embed(&text).await?;
        let neighbours = index.similarity_search(&vector, config.candidate_pool()).await?;
        Ok::<_, RouterError>(neighbours)
    };

    let (model_hits, neighbours) = tokio::try_join!(model_hits, vector_hits)?;

    let results: Vec<RetrievalResult> = model_hits
        .into_iter()
        .flatten()
        .chain(
            neighbours
                .into_iter()
                .map(|(record, score)| RetrievalResult::semantic(record, Some(score), MatchReason::Similarity)),
        )
        .collect();
    let fetched = results.len();

    let merged = dedupe_by_id(filter_by_brand(results, &entities.brands), true);
    let (mut results, similar): (Vec<_>, Vec<_>) = merged.into_iter().partition(|r| {
        r.match_reasons
            .iter()
            .any(|reason| matches!(reason, MatchReason::CompatibleModel(_)))
    });
    results.extend(similar.into_iter().take(config.semantic_top_k));

    debug!(
        "Semantic lookup for '{}': {} candidates, {} kept",
        crate::safe_truncate(&text, 60),
        fetched,
        results.len()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::db::{InMemoryCatalog, ProductRecord};
    use crate::llm::embeddings::EmbeddingError;
    use crate::search::router::models::Origin;

    const VOCAB: [&str; 4] = ["ice", "leak", "door", "pump"];

    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let lower = text.to_lowercase();
            Ok(VOCAB.iter().map(|w| if lower.contains(w) { 1.0 } else { 0.0 }).collect())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::InvalidResponse("no embedding".into()))
        }
    }

    fn product(id: &str, brand: &str, name: &str, models: &[&str]) -> ProductRecord {
        ProductRecord {
            part_number: id.to_string(),
            name: name.to_string(),
            brand: brand.to_string(),
            compatible_models: models.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::from_products(vec![
            product("PS1001", "Whirlpool", "Ice maker assembly", &[]),
            product("PS1002", "Samsung", "Ice maker leak kit", &[]),
            product("PS1003", "Whirlpool", "Door gasket", &["WRS325SDHZ"]),
            product("PS1004", "Whirlpool", "Drain pump", &["WDT780SAEM1"]),
        ]);
        catalog.index_embeddings(&KeywordEmbedder).await.unwrap();
        catalog
    }

    fn analysis_entities(query: &str) -> ExtractedEntities {
        crate::search::router::entities::extract(query)
    }

    #[test]
    fn test_search_text_appends_brands() {
        assert_eq!(search_text("ice maker", &[]), "ice maker");
        assert_eq!(
            search_text("ice maker", &["whirlpool".to_string(), "ge".to_string()]),
            "ice maker whirlpool ge"
        );
    }

    #[tokio::test]
    async fn test_brand_filtered_similarity() {
        let catalog = catalog().await;
        let query = "ice maker not working on my Whirlpool fridge";
        let results = lookup_semantic(
            &catalog,
            &KeywordEmbedder,
            &catalog,
            query,
            &analysis_entities(query),
            &RouterConfig::default(),
        )
        .await
        .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].id(), "PS1001");
        assert!(results.iter().all(|r| r.record.brand == "Whirlpool"));
        assert!(results.iter().all(|r| r.origin == Origin::Semantic));
        assert!(results[0].relevance_score.unwrap() > 0.9);
    }

    #[tokio::test]
    async fn test_model_hits_come_first_and_pick_up_scores() {
        let catalog = catalog().await;
        let query = "pump for WDT780SAEM1";
        let results = lookup_semantic(
            &catalog,
            &KeywordEmbedder,
            &catalog,
            query,
            &analysis_entities(query),
            &RouterConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(results[0].id(), "PS1004");
        assert_eq!(
            results[0].match_reasons,
            vec![MatchReason::CompatibleModel("WDT780SAEM1".into()), MatchReason::Similarity]
        );
        assert!(results[0].relevance_score.is_some());
    }

    #[tokio::test]
    async fn test_truncated_to_top_k() {
        let catalog = catalog().await;
        let config = RouterConfig {
            semantic_top_k: 2,
            ..Default::default()
        };
        let query = "ice maker door leak";
        let results = lookup_semantic(&catalog, &KeywordEmbedder, &catalog, query, &analysis_entities(query), &config)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_model_hits_do_not_crowd_out_vector_hits() {
        let catalog = catalog().await;
        let config = RouterConfig {
            semantic_top_k: 1,
            ..Default::default()
        };
        let query = "ice maker for WRS325SDHZ";
        let results = lookup_semantic(&catalog, &KeywordEmbedder, &catalog, query, &analysis_entities(query), &config)
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["PS1003", "PS1001"]);
    }

    #[tokio::test]
    async fn test_blank_query_skips_embedding() {
        let catalog = catalog().await;
        let results = lookup_semantic(
            &catalog,
            &BrokenEmbedder,
            &catalog,
            "   ",
            &ExtractedEntities::default(),
            &RouterConfig::default(),
        )
        .await
        .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let catalog = catalog().await;
        let query = "ice maker";
        let err = lookup_semantic(
            &catalog,
            &BrokenEmbedder,
            &catalog,
            query,
            &analysis_entities(query),
            &RouterConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RouterError::Embedding(_)));
    }
}
