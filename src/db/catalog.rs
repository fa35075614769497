

use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::client::{HelixClient, HelixClientError};
use crate::search::vector::{VectorIndex, VectorSearchError};
use crate::utils::contains_ignore_case;


#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog query {query} failed: {message}")]
    Query { query: String, message: String },

    #[error("Invalid catalog data: {0}")]
    InvalidData(String),
}

impl CatalogError {
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProductRecord {
    pub part_number: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub compatible_models: Vec<String>,
    pub replace_parts: Vec<String>,
    pub installation: String,
    pub troubleshooting: String,
    pub price: Option<String>,
    pub availability: String,
    pub url: String,
}

impl ProductRecord {

    pub fn is_compatible_with(&self, model_number: &str) -> bool {
        let model = model_number.trim();
        self.compatible_models
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(model))
    }


    /// Case-insensitive containment of any of `brands` in this record's brand.
    pub fn matches_any_brand(&self, brands: &[String]) -> bool {
        brands.iter().any(|b| contains_ignore_case(&self.brand, b))
    }


    pub fn embedding_text(&self) -> String {
        let mut text = format!("{} {} {}", self.name, self.brand, self.category);
        if !self.description.is_empty() {
            text.push_str(". ");
            text.push_str(&self.description);
        }
        if !self.troubleshooting.is_empty() {
            text.push_str(". ");
            text.push_str(&self.troubleshooting);
        }
        text
    }
}


#[async_trait]
pub trait CatalogStore: Send + Sync {

    async fn get_by_id(&self, part_number: &str) -> Result<Option<ProductRecord>, CatalogError>;

    /// Records whose replacement list contains `part_number`.
    async fn find_by_replaced_part(&self, part_number: &str) -> Result<Vec<ProductRecord>, CatalogError>;

    /// Records whose compatible-model list contains `model_number`.
    async fn find_by_compatible_model(&self, model_number: &str) -> Result<Vec<ProductRecord>, CatalogError>;
}


#[async_trait]
impl CatalogStore for Arc<dyn CatalogStore> {
    async fn get_by_id(&self, part_number: &str) -> Result<Option<ProductRecord>, CatalogError> {
        (**self).get_by_id(part_number).await
    }

    async fn find_by_replaced_part(&self, part_number: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        (**self).find_by_replaced_part(part_number).await
    }

    async fn find_by_compatible_model(&self, model_number: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        (**self).find_by_compatible_model(model_number).await
    }
}


impl From<HelixClientError> for CatalogError {
    fn from(e: HelixClientError) -> Self {
        match e {
            HelixClientError::Connection(msg) => Self::Unavailable(msg),
            HelixClientError::RetryExhausted(attempts, msg) => {
                Self::Unavailable(format!("{} (after {} attempts)", msg, attempts))
            }
            HelixClientError::Serialization(err) => Self::InvalidData(err.to_string()),
            other => Self::query("helix", other.to_string()),
        }
    }
}


/// HelixDB-backed catalog. Expects the product schema queries
/// `getProductById`, `getProductsReplacing`, `getProductsForModel` and
/// `searchProductsByVector` to be deployed.
pub struct HelixCatalog {
    client: Arc<HelixClient>,
}

impl HelixCatalog {
    pub fn new(client: Arc<HelixClient>) -> Self {
        Self { client }
    }

    async fn fetch_list(&self, query_name: &str, params: serde_json::Value) -> Result<Vec<ProductRecord>, CatalogError> {
        #[derive(Deserialize)]
        struct ProductList {
            #[serde(default)]
            products: Vec<ProductRecord>,
        }

        match self.client.execute_query::<ProductList, _>(query_name, &params).await {
            Ok(list) => {
                debug!("{}: {} products", query_name, list.products.len());
                Ok(list.products)
            }
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => {
                warn!("Catalog query {} failed: {}", query_name, e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl CatalogStore for HelixCatalog {
    async fn get_by_id(&self, part_number: &str) -> Result<Option<ProductRecord>, CatalogError> {
        #[derive(Deserialize)]
        struct ProductResult {
            product: Option<ProductRecord>,
        }

        let params = serde_json::json!({ "part_number": part_number });
        match self.client.execute_query::<ProductResult, _>("getProductById", &params).await {
            Ok(result) => Ok(result.product),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                warn!("Catalog fetch for {} failed: {}", part_number, e);
                Err(e.into())
            }
        }
    }

    async fn find_by_replaced_part(&self, part_number: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.fetch_list("getProductsReplacing", serde_json::json!({ "part_number": part_number }))
            .await
    }

    async fn find_by_compatible_model(&self, model_number: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.fetch_list("getProductsForModel", serde_json::json!({ "model_number": model_number }))
            .await
    }
}

#[async_trait]
impl VectorIndex for HelixCatalog {
    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<(ProductRecord, f32)>, VectorSearchError> {
        #[derive(Deserialize)]
        struct ScoredProduct {
            #[serde(flatten)]
            product: ProductRecord,
            #[serde(default)]
            score: f32,
        }

        #[derive(Deserialize)]
        struct VectorResult {
            #[serde(default)]
            products: Vec<ScoredProduct>,
        }

        let params = serde_json::json!({
            "query_vector": vector,
            "limit": k,
        });

        match self.client.execute_query::<VectorResult, _>("searchProductsByVector", &params).await {
            Ok(result) => Ok(result
                .products
                .into_iter()
                .map(|p| (p.product, p.score))
                .collect()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(VectorSearchError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            part_number: "PS11752778".to_string(),
            name: "Refrigerator Door Shelf Bin".to_string(),
            brand: "Whirlpool".to_string(),
            compatible_models: vec!["WDT780SAEM1".to_string(), "wrs325sdhz".to_string()],
            replace_parts: vec!["AP6019471".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_compatibility_is_case_insensitive() {
        let r = record();
        assert!(r.is_compatible_with("WRS325SDHZ"));
        assert!(r.is_compatible_with(" wdt780saem1 "));
        assert!(!r.is_compatible_with("WDT780"));
    }

    #[test]
    fn test_brand_containment() {
        let r = record();
        assert!(r.matches_any_brand(&["whirlpool".to_string()]));
        assert!(r.matches_any_brand(&["ge".to_string(), "pool".to_string()]));
        assert!(!r.matches_any_brand(&["samsung".to_string()]));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let json = r#"{"part_number": "PS123456", "name": "Pump"}"#;
        let r: ProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.part_number, "PS123456");
        assert!(r.compatible_models.is_empty());
        assert!(r.price.is_none());
    }

    #[test]
    fn test_client_error_mapping() {
        let err: CatalogError = HelixClientError::RetryExhausted(3, "timeout".into()).into();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
