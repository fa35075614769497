

use std::collections::HashMap;
use std::path::Path;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::catalog::{CatalogError, CatalogStore, ProductRecord};
use crate::core::Result;
use crate::llm::embeddings::{Embedder, EmbeddingError};
use crate::search::vector::{cosine_similarity, VectorIndex, VectorSearchError};


#[derive(Default)]
struct CatalogState {
    products: Vec<ProductRecord>,
    by_id: HashMap<String, usize>,
    by_replaced: HashMap<String, Vec<usize>>,
    by_model: HashMap<String, Vec<usize>>,
    embeddings: HashMap<usize, Vec<f32>>,
}

impl CatalogState {
    fn key(value: &str) -> String {
        value.trim().to_uppercase()
    }

    fn insert(&mut self, record: ProductRecord) {
        let id = Self::key(&record.part_number);
        if let Some(&idx) = self.by_id.get(&id) {
            debug!("Replacing catalog entry {}", id);
            self.unindex(idx);
            self.embeddings.remove(&idx);
            self.index(idx, &record);
            self.products[idx] = record;
            return;
        }

        let idx = self.products.len();
        self.index(idx, &record);
        self.by_id.insert(id, idx);
        self.products.push(record);
    }

    fn index(&mut self, idx: usize, record: &ProductRecord) {
        for part in &record.replace_parts {
            let slot = self.by_replaced.entry(Self::key(part)).or_default();
            if !slot.contains(&idx) {
                slot.push(idx);
            }
        }
        for model in &record.compatible_models {
            let slot = self.by_model.entry(Self::key(model)).or_default();
            if !slot.contains(&idx) {
                slot.push(idx);
            }
        }
    }

    fn unindex(&mut self, idx: usize) {
        for slots in self.by_replaced.values_mut().chain(self.by_model.values_mut()) {
            slots.retain(|&i| i != idx);
        }
    }

    fn collect(&self, indexes: Option<&Vec<usize>>) -> Vec<ProductRecord> {
        let mut indexes = indexes.cloned().unwrap_or_default();
        indexes.sort_unstable();
        indexes.into_iter().map(|i| self.products[i].clone()).collect()
    }
}


#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<ProductRecord>),
    Wrapped { products: Vec<ProductRecord> },
}


/// Process-local catalog with replacement and model indexes and brute-force
/// cosine search. Lookups return records in insertion order.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn from_products(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }


    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let products = match serde_json::from_str::<CatalogFile>(&raw)? {
            CatalogFile::List(products) => products,
            CatalogFile::Wrapped { products } => products,
        };

        let skipped = products.iter().filter(|p| p.part_number.trim().is_empty()).count();
        if skipped > 0 {
            warn!("Skipping {} catalog entries without a part number", skipped);
        }

        let catalog = Self::from_products(
            products.into_iter().filter(|p| !p.part_number.trim().is_empty()),
        );
        info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }


    pub fn insert(&self, record: ProductRecord) {
        self.state.write().insert(record);
    }


    pub fn len(&self) -> usize {
        self.state.read().products.len()
    }


    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    pub fn set_embedding(&self, part_number: &str, embedding: Vec<f32>) -> bool {
        let mut state = self.state.write();
        match state.by_id.get(&CatalogState::key(part_number)).copied() {
            Some(idx) => {
                state.embeddings.insert(idx, embedding);
                true
            }
            None => false,
        }
    }


    pub async fn index_embeddings(&self, embedder: &dyn Embedder) -> std::result::Result<usize, EmbeddingError> {
        let pending: Vec<(String, String)> = {
            let state = self.state.read();
            state
                .products
                .iter()
                .enumerate()
                .filter(|(idx, _)| !state.embeddings.contains_key(idx))
                .map(|(_, p)| (p.part_number.clone(), p.embedding_text()))
                .collect()
        };

        let mut indexed = 0;
        for (part_number, text) in pending {
            let embedding = embedder.embed(&text).await?;
            if self.set_embedding(&part_number, embedding) {
                indexed += 1;
            }
        }

        info!("Indexed embeddings for {} products", indexed);
        Ok(indexed)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_by_id(&self, part_number: &str) -> std::result::Result<Option<ProductRecord>, CatalogError> {
        let state = self.state.read();
        Ok(state
            .by_id
            .get(&CatalogState::key(part_number))
            .map(|&idx| state.products[idx].clone()))
    }

    async fn find_by_replaced_part(&self, part_number: &str) -> std::result::Result<Vec<ProductRecord>, CatalogError> {
        let state = self.state.read();
        Ok(state.collect(state.by_replaced.get(&CatalogState::key(part_number))))
    }

    async fn find_by_compatible_model(&self, model_number: &str) -> std::result::Result<Vec<ProductRecord>, CatalogError> {
        let state = self.state.read();
        Ok(state.collect(state.by_model.get(&CatalogState::key(model_number))))
    }
}

#[async_trait]
impl VectorIndex for InMemoryCatalog {
    async fn similarity_search(&self, vector: &[f32], k: usize) -> std::result::Result<Vec<(ProductRecord, f32)>, VectorSearchError> {
        let state = self.state.read();

        let mut scored = Vec::with_capacity(state.embeddings.len());
        for (idx, embedding) in &state.embeddings {
            scored.push((*idx, cosine_similarity(vector, embedding)?));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(idx, score)| (state.products[idx].clone(), score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, replaces: &[&str], models: &[&str]) -> ProductRecord {
        ProductRecord {
            part_number: id.to_string(),
            name: format!("Part {}", id),
            replace_parts: replaces.iter().map(|s| s.to_string()).collect(),
            compatible_models: models.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_products(vec![
            product("PS11752778", &["AP6019471"], &["WDT780SAEM1", "WRS325SDHZ"]),
            product("PS3406971", &["AP6019471"], &["WDT780SAEM1"]),
            product("PS12364199", &[], &["FFSS2615TS0"]),
        ])
    }

    #[test]
    fn test_get_by_id_is_case_insensitive() {
        let catalog = catalog();
        let hit = tokio_test::block_on(catalog.get_by_id("ps11752778")).unwrap();
        assert_eq!(hit.unwrap().part_number, "PS11752778");
        assert!(tokio_test::block_on(catalog.get_by_id("PS000000")).unwrap().is_none());
    }

    #[test]
    fn test_replacement_index_keeps_insertion_order() {
        let catalog = catalog();
        let hits = tokio_test::block_on(catalog.find_by_replaced_part("AP6019471")).unwrap();
        let ids: Vec<_> = hits.iter().map(|p| p.part_number.as_str()).collect();
        assert_eq!(ids, vec!["PS11752778", "PS3406971"]);
    }

    #[test]
    fn test_model_index() {
        let catalog = catalog();
        let hits = tokio_test::block_on(catalog.find_by_compatible_model("wdt780saem1")).unwrap();
        assert_eq!(hits.len(), 2);
        let none = tokio_test::block_on(catalog.find_by_compatible_model("XYZ12345")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_reinsert_replaces_and_reindexes() {
        let catalog = catalog();
        catalog.insert(product("PS3406971", &[], &["KDTE334GPS0"]));
        assert_eq!(catalog.len(), 3);

        let old = tokio_test::block_on(catalog.find_by_replaced_part("AP6019471")).unwrap();
        assert_eq!(old.len(), 1);
        let new = tokio_test::block_on(catalog.find_by_compatible_model("KDTE334GPS0")).unwrap();
        assert_eq!(new[0].part_number, "PS3406971");
    }

    #[test]
    fn test_similarity_search_orders_by_score() {
        let catalog = catalog();
        assert!(catalog.set_embedding("PS11752778", vec![1.0, 0.0]));
        assert!(catalog.set_embedding("PS3406971", vec![0.7, 0.7]));
        assert!(catalog.set_embedding("PS12364199", vec![0.0, 1.0]));
        assert!(!catalog.set_embedding("PS404", vec![1.0, 1.0]));

        let hits = tokio_test::block_on(catalog.similarity_search(&[1.0, 0.1], 2)).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.part_number, "PS11752778");
        assert_eq!(hits[1].0.part_number, "PS3406971");
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn test_similarity_search_tolerates_nan_embeddings() {
        let catalog = catalog();
        assert!(catalog.set_embedding("PS11752778", vec![1.0, 0.0]));
        assert!(catalog.set_embedding("PS3406971", vec![f32::NAN, 0.0]));
        assert!(catalog.set_embedding("PS12364199", vec![0.0, 1.0]));

        let hits = tokio_test::block_on(catalog.similarity_search(&[1.0, 0.0], 3)).unwrap();
        let ids: Vec<_> = hits.iter().map(|(p, _)| p.part_number.as_str()).collect();
        assert_eq!(ids.len(), 3);
        let pos = |id: &str| ids.iter().position(|x| *x == id).unwrap();
        assert!(pos("PS11752778") < pos("PS12364199"));
    }

    #[test]
    fn test_load_json_accepts_wrapped_and_skips_blank_ids() {
        let dir = std::env::temp_dir().join(format!("partscout-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("products.json");
        std::fs::write(
            &path,
            r#"{"products": [{"part_number": "PS11752778", "name": "Bin"}, {"name": "orphan"}]}"#,
        )
        .unwrap();

        let catalog = InMemoryCatalog::load_json(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
